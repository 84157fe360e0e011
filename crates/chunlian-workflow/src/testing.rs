//! Scripted model double and a terse prompt catalog for unit tests.
//!
//! [`TestCatalog`] puts a one-word route name into every system prompt
//! (`analysis`, `upper`, `lower`, …); [`ScriptedBackend`] answers by route.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use chunlian_core::{
    CoupletClient,
    error::{ChunlianError, Result},
    model::Model,
    provider::{BoxFuture, ChatCompleteParameters, ChatCompletionProvider},
};
use chunlian_types::{
    couplet::{BannerCount, CoupletCandidate, RequiredLineLength, Topic},
    prompts::{CoupletContext, PromptCatalog, PromptText},
};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Fail,
}

/// Answers each route from a queue; the last reply of a route repeats.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, String)>>,
    cancel_on: Option<(String, CancellationToken)>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(self, route: &str, text: impl Into<String>) -> Self {
        self.push(route, Reply::Text(text.into()))
    }

    pub(crate) fn replies<I, T>(mut self, route: &str, texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for text in texts {
            self = self.reply(route, text);
        }
        self
    }

    pub(crate) fn fail(self, route: &str) -> Self {
        self.push(route, Reply::Fail)
    }

    /// Cancel `token` while the call on `route` is in flight.
    pub(crate) fn cancel_on(mut self, route: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((route.to_owned(), token));
        self
    }

    fn push(mut self, route: &str, reply: Reply) -> Self {
        self.scripts
            .get_mut()
            .unwrap()
            .entry(route.to_owned())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn calls(&self, route: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(r, _)| r == route).count()
    }

    /// User prompts sent on `route`, in call order.
    pub(crate) fn prompts(&self, route: &str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == route)
            .map(|(_, user)| user.clone())
            .collect()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self, route: &str) -> Option<Reply> {
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(route)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl ChatCompletionProvider for ScriptedBackend {
    fn chat_complete<'p>(&'p self, params: ChatCompleteParameters) -> BoxFuture<'p, Result<String>> {
        let route = params.system_prompt().unwrap_or_default().to_owned();
        let user = params.user_prompt().unwrap_or_default().to_owned();
        self.calls.lock().unwrap().push((route.clone(), user));

        if let Some((cancel_route, token)) = &self.cancel_on {
            if *cancel_route == route {
                token.cancel();
            }
        }

        let reply = self.next_reply(&route);
        Box::pin(async move {
            match reply {
                Some(Reply::Text(text)) => Ok(text),
                Some(Reply::Fail) => Err(ChunlianError::Backend("scripted gateway failure".into())),
                None => Err(ChunlianError::InvalidRequest(format!("unscripted route `{route}`"))),
            }
        })
    }
}

pub(crate) fn client(backend: &Arc<ScriptedBackend>) -> CoupletClient<Arc<ScriptedBackend>> {
    CoupletClient::new(Arc::clone(backend), Model::from_id("test-model"))
}

fn retry_note(ctx: CoupletContext<'_>) -> String {
    ctx.feedback
        .map(|f| {
            format!(
                " | previous {} / {}: {} ({})",
                f.upper_line.as_deref().unwrap_or("-"),
                f.lower_line.as_deref().unwrap_or("-"),
                f.problems.join("; "),
                f.suggestions.join("; ")
            )
        })
        .unwrap_or_default()
}

/// Routes by system prompt; user prompts carry just enough to assert on.
pub(crate) struct TestCatalog;

impl PromptCatalog for TestCatalog {
    fn topic_analysis(&self, topic: &Topic, length: RequiredLineLength) -> PromptText {
        PromptText::new("analysis", format!("{topic} {length}"))
    }

    fn upper_line(&self, ctx: CoupletContext<'_>) -> PromptText {
        PromptText::new("upper", format!("{} {}{}", ctx.topic, ctx.length, retry_note(ctx)))
    }

    fn lower_line(&self, ctx: CoupletContext<'_>, upper: &str) -> PromptText {
        PromptText::new("lower", format!("{} {upper}{}", ctx.length, retry_note(ctx)))
    }

    fn review(&self, _ctx: CoupletContext<'_>, upper: &str, lower: &str) -> PromptText {
        PromptText::new("review", format!("{upper} / {lower}"))
    }

    fn election(&self, _ctx: CoupletContext<'_>, candidates: &[&CoupletCandidate]) -> PromptText {
        let listed: Vec<String> = candidates
            .iter()
            .map(|c| format!("{} / {}", c.upper_line, c.lower_line))
            .collect();
        PromptText::new("election", listed.join("\n"))
    }

    fn banners(&self, _ctx: CoupletContext<'_>, _upper: &str, _lower: &str, count: BannerCount) -> PromptText {
        PromptText::new("banners", count.get().to_string())
    }

    fn horizontal_scroll(&self, _ctx: CoupletContext<'_>, upper: &str, lower: &str) -> PromptText {
        PromptText::new("scroll", format!("{upper} / {lower}"))
    }
}
