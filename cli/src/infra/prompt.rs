//! Infrastructure implementation of the `Prompter` port on top of dialoguer.

use anyhow::Result;
use dialoguer::{Confirm, Input, Password};

use crate::application::ports::Prompter;

pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn input(&self, prompt: &str, default: &str) -> Result<String> {
        let mut input = Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true);
        if !default.is_empty() {
            input = input.default(default.to_string());
        }
        Ok(input.interact_text()?)
    }

    fn password(&self, prompt: &str) -> Result<String> {
        Ok(Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?)
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }
}
