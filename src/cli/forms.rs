use crate::cli::{CssArgs, LogArgs, TargetArgs};
use crate::records::{CssTestInput, Environment, SessionInput, Swimmer, TargetInput};
use anyhow::{Context, Result, bail};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use std::str::FromStr;

/// Fills fields not given on the command line, prompting when allowed.
struct Prompter {
    theme: ColorfulTheme,
    interactive: bool,
}

impl Prompter {
    fn new(no_input: bool) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            interactive: !no_input,
        }
    }

    fn value<T>(&self, given: Option<T>, prompt: &str, default: Option<T>) -> Result<T>
    where
        T: Clone + ToString + FromStr,
        T::Err: ToString,
    {
        if let Some(value) = given {
            return Ok(value);
        }

        if !self.interactive {
            return match default {
                Some(value) => Ok(value),
                None => bail!("Missing required field: {prompt}"),
            };
        }

        let input = Input::<T>::with_theme(&self.theme).with_prompt(prompt);
        let input = match default {
            Some(value) => input.default(value),
            None => input,
        };

        input
            .interact_text()
            .with_context(|| format!("Failed to read input: {prompt}"))
    }

    fn text(&self, given: Option<String>, prompt: &str) -> Result<String> {
        if let Some(value) = given {
            return Ok(value);
        }
        if !self.interactive {
            return Ok(String::new());
        }

        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .with_context(|| format!("Failed to read input: {prompt}"))
    }

    fn choice<T: Copy>(
        &self,
        given: Option<T>,
        prompt: &str,
        options: &[(T, &str)],
    ) -> Result<T> {
        if let Some(value) = given {
            return Ok(value);
        }
        if !self.interactive {
            bail!("Missing required field: {prompt}");
        }

        let labels = options.iter().map(|(_, label)| *label).collect::<Vec<_>>();
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(0)
            .items(&labels)
            .interact()
            .with_context(|| format!("Failed to read selection: {prompt}"))?;

        options
            .get(index)
            .map(|(value, _)| *value)
            .with_context(|| format!("Invalid selection for {prompt}"))
    }
}

pub fn collect_session(args: LogArgs) -> Result<SessionInput> {
    let prompter = Prompter::new(args.no_input);

    let date = match args.date {
        Some(date) => Some(date),
        None if prompter.interactive => Some(prompter.text(None, "Date (dd-mmm-yy, blank = today)")?),
        None => None,
    };

    let environment = match args.environment {
        Some(environment) => environment,
        None if prompter.interactive => prompter.choice(
            None,
            "Environment",
            &[
                (Environment::Pool, "pool"),
                (Environment::OpenWater, "open_water"),
            ],
        )?,
        None => Environment::Pool,
    };

    let roster = Swimmer::ROSTER
        .iter()
        .map(|swimmer| (*swimmer, swimmer.as_str()))
        .collect::<Vec<_>>();

    Ok(SessionInput {
        date,
        environment,
        distance_m: prompter.value(args.distance_m, "Distance (m)", None)?,
        total_time_min: prompter.value(args.total_time_min, "Total Time (min)", None)?,
        moving_time_min: prompter.value(
            args.moving_time_min,
            "Moving Time (min, optional)",
            Some(0.0),
        )?,
        rest_estimate_min: prompter.value(args.rest_estimate_min, "Rest Estimate (min)", Some(0.0))?,
        sets_text: prompter.text(args.sets_text, "Set Structure (e.g., 8x100 @1:50, 4x50 kick)")?,
        css_pace: prompter.text(args.css_pace, "CSS Pace (s/100m, optional)")?,
        avg_pace: prompter.text(args.avg_pace, "Average Pace (s/100m)")?,
        rpe: prompter.value(args.rpe, "Intensity (RPE 1-10)", Some(5))?,
        notes: prompter.text(args.notes, "Notes (how you felt, niggles, water temp)")?,
        team: prompter.text(args.team, "Team")?,
        swimmer: prompter.choice(args.swimmer, "Swimmer", &roster)?,
    })
}

pub fn collect_css_test(args: CssArgs) -> Result<CssTestInput> {
    let prompter = Prompter::new(args.no_input);

    Ok(CssTestInput {
        date: args.date,
        swimmer: prompter.value(args.swimmer, "Swimmer", None)?,
        time_200_s: prompter.value(args.time_200_s, "200m Time (s)", None)?,
        time_400_s: prompter.value(args.time_400_s, "400m Time (s)", None)?,
    })
}

pub fn collect_target(args: TargetArgs) -> Result<TargetInput> {
    let prompter = Prompter::new(args.no_input);

    Ok(TargetInput {
        week_start: args.week_start,
        swimmer: prompter.value(args.swimmer, "Swimmer", None)?,
        km_target: prompter.value(args.km_target, "KM Target", None)?,
    })
}
