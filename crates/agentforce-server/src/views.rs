//! HTML Views
//!
//! Server-side rendered pages and htmx fragments. Templates are compiled into
//! the binary; `.html` names get automatic escaping.

use agentforce_core::{ChatTurn, ConfigKey, Projection};
use minijinja::{Environment, context};
use serde::Serialize;

const CHAT_TITLE: &str = "Agentforce AI Agent Chat";
const CONFIG_TITLE: &str = "Agentforce API Client - Configuration Required";

/// Row on the configuration page
#[derive(Serialize)]
struct KeyRow {
    name: &'static str,
    description: &'static str,
    missing: bool,
}

/// Template environment
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../templates/base.html"))?;
        env.add_template("chat.html", include_str!("../templates/chat.html"))?;
        env.add_template(
            "config_required.html",
            include_str!("../templates/config_required.html"),
        )?;
        env.add_template("turn.html", include_str!("../templates/turn.html"))?;
        env.add_template("alert.html", include_str!("../templates/alert.html"))?;
        Ok(Self { env })
    }

    /// Full chat page
    pub fn chat_page(&self) -> Result<String, minijinja::Error> {
        self.env
            .get_template("chat.html")?
            .render(context! { title => CHAT_TITLE })
    }

    /// Instructions listing every required variable, flagging the absent ones
    pub fn config_required_page(&self, missing: &[ConfigKey]) -> Result<String, minijinja::Error> {
        let keys: Vec<KeyRow> = ConfigKey::ALL
            .into_iter()
            .map(|key| KeyRow {
                name: key.env_var(),
                description: key.description(),
                missing: missing.contains(&key),
            })
            .collect();

        self.env
            .get_template("config_required.html")?
            .render(context! { title => CONFIG_TITLE, keys })
    }

    /// Transcript fragment for one chat turn
    pub fn turn_fragment(&self, turn: &ChatTurn) -> Result<String, minijinja::Error> {
        let template = self.env.get_template("turn.html")?;
        match turn {
            ChatTurn::Exchange { user_text, reply } => template.render(context! {
                user_text,
                reply => reply.as_str(),
                dump => matches!(reply, Projection::Dump(_)),
            }),
            ChatTurn::Failed { error, .. } => template.render(context! {
                error => error.to_string(),
            }),
        }
    }

    /// Danger alert fragment
    pub fn alert(&self, message: &str) -> Result<String, minijinja::Error> {
        self.env
            .get_template("alert.html")?
            .render(context! { message })
    }
}
