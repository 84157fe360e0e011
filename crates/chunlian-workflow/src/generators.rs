//! One function per stage: render the catalog prompt, call the gateway once,
//! parse the answer. Nothing here retries or validates lengths; that is the
//! orchestrator's job.

use std::sync::Arc;

use chunlian_core::{CoupletClient, error::Result, provider::ChatCompletionProvider};
use chunlian_types::{
    couplet::{BannerCount, CoupletCandidate, RequiredLineLength, Topic},
    outputs::{ElectionChoice, ReviewVerdict, TopicAnalysis},
    prompts::{
        AnalysisPrompt, BannersPrompt, CoupletContext, ElectionPrompt, HorizontalScrollPrompt,
        LowerLinePrompt, PromptCatalog, ReviewPrompt, UpperLinePrompt,
    },
};

pub struct StageGenerators<B> {
    client: CoupletClient<B>,
    catalog: Arc<dyn PromptCatalog>,
}

impl<B> StageGenerators<B>
where
    B: ChatCompletionProvider,
{
    pub fn new(client: CoupletClient<B>, catalog: Arc<dyn PromptCatalog>) -> Self {
        Self { client, catalog }
    }

    pub(crate) fn set_catalog(&mut self, catalog: Arc<dyn PromptCatalog>) {
        self.catalog = catalog;
    }

    pub async fn analyze_topic(&self, topic: &Topic, length: RequiredLineLength) -> Result<TopicAnalysis> {
        let prompt = AnalysisPrompt::from(self.catalog.topic_analysis(topic, length));
        let raw = self.client.complete_text(prompt).await?;
        Ok(TopicAnalysis::from_completion(&raw)?)
    }

    pub async fn upper_line(&self, ctx: CoupletContext<'_>) -> Result<String> {
        let prompt = UpperLinePrompt::from(self.catalog.upper_line(ctx));
        let out = self.client.prompt_execute(prompt).await?;
        Ok(out.upper_couplet.trim().to_owned())
    }

    pub async fn lower_line(&self, ctx: CoupletContext<'_>, upper: &str) -> Result<String> {
        let prompt = LowerLinePrompt::from(self.catalog.lower_line(ctx, upper));
        let out = self.client.prompt_execute(prompt).await?;
        Ok(out.lower_couplet.trim().to_owned())
    }

    pub async fn review(&self, ctx: CoupletContext<'_>, upper: &str, lower: &str) -> Result<ReviewVerdict> {
        let prompt = ReviewPrompt::from(self.catalog.review(ctx, upper, lower));
        self.client.prompt_execute(prompt).await
    }

    pub async fn banners(
        &self,
        ctx: CoupletContext<'_>,
        upper: &str,
        lower: &str,
        count: BannerCount,
    ) -> Result<Vec<String>> {
        let prompt = BannersPrompt::from(self.catalog.banners(ctx, upper, lower, count));
        let out = self.client.prompt_execute(prompt).await?;
        Ok(out
            .spring_scrolls
            .into_iter()
            .map(|banner| banner.trim().to_owned())
            .collect())
    }

    pub async fn horizontal_scroll(&self, ctx: CoupletContext<'_>, upper: &str, lower: &str) -> Result<String> {
        let prompt = HorizontalScrollPrompt::from(self.catalog.horizontal_scroll(ctx, upper, lower));
        let out = self.client.prompt_execute(prompt).await?;
        Ok(out.horizontal_scroll.trim().to_owned())
    }

    /// Ask the model to pick among `candidates` (enumerated 1-based).
    pub async fn compare(&self, ctx: CoupletContext<'_>, candidates: &[&CoupletCandidate]) -> Result<ElectionChoice> {
        let prompt = ElectionPrompt::from(self.catalog.election(ctx, candidates));
        self.client.prompt_execute(prompt).await
    }
}
