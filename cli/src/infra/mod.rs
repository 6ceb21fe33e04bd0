//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, package
//! and runtime installation, firewall rules, service control, prompts and
//! the installer defaults file.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod firewall;
pub mod logging;
pub mod prompt;
pub mod provisioner;
pub mod service;
