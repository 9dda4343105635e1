//! Line-delimited JSON command protocol
//!
//! One request per line, one reply per line. Bodies use the same shapes as
//! the rewrite control API: `{domain, answer}` entries, and
//! `{target, update}` pairs for updates.
//!
//! ```text
//! → {"op":"add","domain":"ads.example.com","answer":"0.0.0.0"}
//! ← {"ok":true}
//! → {"op":"list","filter":"example"}
//! ← {"ok":true,"rewrites":[{"domain":"ads.example.com","answer":"0.0.0.0"}]}
//! → {"op":"update","target":{"domain":"nope.com","answer":"1.1.1.1"},"update":{"domain":"x.com","answer":"2.2.2.2"}}
//! ← {"ok":false,"kind":"not_found","error":"Target rule not found: nope.com -> 1.1.1.1"}
//! ```

use rewrite_core::{Error, Rule, RuleStore};
use serde::{Deserialize, Serialize};

/// A decoded request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// List rules, optionally filtered by substring
    List {
        #[serde(default)]
        filter: String,
    },
    /// Append a rule
    Add(Rule),
    /// Remove every rule equal to the entry
    Delete(Rule),
    /// Replace `target` with `update` in place
    Update { target: Rule, update: Rule },
}

/// A reply written back to the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewrites: Option<Vec<Rule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    fn failed(kind: &'static str, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            kind: Some(kind),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

impl From<Error> for Reply {
    fn from(err: Error) -> Self {
        let kind = match err {
            Error::Validation(_) => "validation",
            Error::Duplicate { .. } => "duplicate",
            Error::NotFound { .. } => "not_found",
            _ => "internal",
        };
        Reply::failed(kind, err.to_string())
    }
}

/// Decode one request line and run it against the store
pub async fn handle_line(store: &RuleStore, line: &str) -> Reply {
    match serde_json::from_str::<Command>(line) {
        Ok(command) => execute(store, command).await,
        Err(e) => Reply::failed("bad_request", format!("json decode: {}", e)),
    }
}

/// Run a decoded request against the store
pub async fn execute(store: &RuleStore, command: Command) -> Reply {
    let result = match command {
        Command::List { filter } => {
            return Reply {
                rewrites: Some(store.list(&filter).await),
                ..Reply::ok()
            };
        }
        Command::Add(rule) => store.add(&rule.domain, &rule.answer).await.map(|()| Reply::ok()),
        Command::Delete(rule) => store
            .delete(&rule.domain, &rule.answer)
            .await
            .map(|removed| Reply {
                removed: Some(removed),
                ..Reply::ok()
            }),
        Command::Update { target, update } => store
            .update(&target.domain, &target.answer, &update.domain, &update.answer)
            .await
            .map(|()| Reply::ok()),
    };

    result.unwrap_or_else(Reply::from)
}
