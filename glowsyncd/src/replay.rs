//! Runs the configured switches against a script of state changes.
//!
//! Each non-blank line of a script is `entity_id state [key=value ...]`.
//! Values containing spaces are wrapped in double quotes. The pair
//! `artwork=FILE` sets a media player's artwork from an image file
//! instead of adding an attribute. Lines starting with `#` are
//! comments.

use crate::config::SwitchConfig;
use glowsync_api::{
    dispatch::ServiceCall, Attributes, EntityId, Error, Result, UpstreamUpdate,
};
use glowsync_host_simple::{RecordingDispatcher, SimpleHost};
use glowsync_switch::ToggleableSyncSwitch;
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::{sync::mpsc::UnboundedReceiver, time::timeout};
use tracing::{debug, info};

const ATTR_ARTWORK: &str = "artwork";

// How long to wait for a switch to react before deciding a step
// produced no more service calls.

const SETTLE: Duration = Duration::from_millis(50);

#[derive(Debug, PartialEq)]
pub struct Step {
    pub entity: EntityId,
    pub update: UpstreamUpdate,
    pub artwork: Option<PathBuf>,
}

// Splits a line into whitespace-separated words. A double-quoted
// section can contain spaces; the quotes themselves are removed.

fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = vec![];
    let mut cur = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut cur));
                    in_word = false;
                }
            }
            c => {
                cur.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err(Error::ParseError("unterminated quote".into()));
    }
    if in_word {
        words.push(cur)
    }
    Ok(words)
}

/// Parses one script line. Blank lines and comments give `None`.
pub fn parse_line(line: &str) -> Result<Option<Step>> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let words = split_words(line)?;
    let mut words = words.iter();

    let entity = words
        .next()
        .ok_or_else(|| Error::ParseError("missing entity id".into()))?
        .parse::<EntityId>()?;
    let state = words
        .next()
        .ok_or_else(|| Error::ParseError(format!("{} has no state", entity)))?;

    let mut attributes = Attributes::new();
    let mut artwork = None;

    for pair in words {
        match pair.split_once('=') {
            Some((ATTR_ARTWORK, v)) => artwork = Some(PathBuf::from(v)),
            Some((k, v)) if !k.is_empty() => {
                let _ = attributes.insert(k.to_string(), v.to_string());
            }
            _ => {
                return Err(Error::ParseError(format!(
                    "'{}' isn't a key=value pair",
                    pair
                )))
            }
        }
    }

    Ok(Some(Step {
        entity,
        update: UpstreamUpdate::from_state(Some(state.as_str()), attributes),
        artwork,
    }))
}

/// Parses a whole script. Errors name the offending line.
pub fn parse_script(text: &str) -> Result<Vec<Step>> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            parse_line(line)
                .map_err(|e| Error::ParseError(format!("line {}: {}", idx + 1, e)))
                .transpose()
        })
        .collect()
}

// Collects the service calls made since the last drain. It stops
// after the dispatcher has been quiet for `SETTLE`.

async fn drain(rx: &mut UnboundedReceiver<ServiceCall>) -> Vec<ServiceCall> {
    let mut calls = vec![];

    while let Ok(Some(call)) = timeout(SETTLE, rx.recv()).await {
        calls.push(call)
    }
    calls
}

/// Prints a service call as one line of JSON.
pub fn print_call(call: &ServiceCall) -> Result<()> {
    let text = serde_json::to_string(call)
        .map_err(|e| Error::OperationError(e.to_string()))?;

    println!("{}", text);
    Ok(())
}

/// Builds every switch on an in-memory host, turns them on and feeds
/// them `steps`. Each service call they make is passed to `emit`.
pub async fn run<F>(
    switches: Vec<SwitchConfig>, steps: Vec<Step>, mut emit: F,
) -> Result<()>
where
    F: FnMut(&ServiceCall) -> Result<()>,
{
    let host = Arc::new(SimpleHost::new());
    let (disp, mut rx) = RecordingDispatcher::new();
    let disp = Arc::new(disp);
    let mut active = vec![];

    for sw in switches {
        host.add_entity(&sw.options.source)?;
        active.push(ToggleableSyncSwitch::new(
            &sw.name,
            sw.mode,
            sw.options,
            host.clone(),
            disp.clone(),
        )?);
    }

    for sw in &active {
        sw.turn_on().await
    }
    info!("{} switch(es) on", active.len());

    for step in steps {
        if let Some(path) = &step.artwork {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                Error::OperationError(format!("{}: {}", path.display(), e))
            })?;

            host.set_image(&step.entity, Some(bytes))?
        }

        debug!("{} -> {:?}", &step.entity, &step.update);
        host.set_state(&step.entity, step.update)?;
        for call in drain(&mut rx).await {
            emit(&call)?
        }
    }

    for sw in &active {
        sw.turn_off().await
    }
    Ok(())
}
