use chunlian_prompt::builder::PromptBuilder;

use super::{CoupletContext, PromptCatalog, PromptText};
use crate::{
    couplet::{BannerCount, CoupletCandidate, RequiredLineLength, Topic},
    fragments::LunarYear,
};

const ANALYSIS_SYSTEM: &str = "你是春联主题分析专家。深入分析用户主题，输出JSON格式的结构化创作指导。";
const UPPER_SYSTEM: &str = "生成春联上联。输出JSON。";
const LOWER_SYSTEM: &str = "根据上联生成下联。输出JSON。";
const REVIEW_SYSTEM: &str = "审查春联格式。输出JSON。";
const ELECTION_SYSTEM: &str = "选出最优春联。输出JSON。";
const SCROLL_SYSTEM: &str = "生成横批。输出JSON。";

/// The default Chinese prompts, stamped with the festival year.
#[derive(Debug, Clone, Copy)]
pub struct ClassicCatalog {
    year: LunarYear,
}

impl Default for ClassicCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassicCatalog {
    /// Prompts for the upcoming Spring Festival.
    pub fn new() -> Self {
        Self {
            year: LunarYear::upcoming(),
        }
    }

    pub fn for_year(year: i32) -> Self {
        Self {
            year: LunarYear::new(year),
        }
    }

    pub fn year(&self) -> LunarYear {
        self.year
    }
}

fn guidance(builder: PromptBuilder, ctx: &CoupletContext<'_>) -> PromptBuilder {
    builder
        .add_section_h2("创作指导")
        .add_line(&ctx.analysis.guidance)
        .add_blank_line()
}

/// "上次生成结果及问题" section of a couplet retry; empty on a first attempt.
fn previous_attempt(builder: PromptBuilder, ctx: &CoupletContext<'_>) -> PromptBuilder {
    let Some(feedback) = ctx.feedback.filter(|f| !f.is_empty()) else {
        return builder;
    };

    let mut builder = builder.add_section_h2("上次生成结果及问题");
    if let Some(upper) = &feedback.upper_line {
        builder = builder.add_key_value("上联", upper);
    }
    if let Some(lower) = &feedback.lower_line {
        builder = builder.add_key_value("下联", lower);
    }
    if !feedback.problems.is_empty() {
        builder = builder.add_line("问题：").add_numbered(&feedback.problems);
    }
    if !feedback.suggestions.is_empty() {
        builder = builder.add_line("改进建议：").add_bullets(&feedback.suggestions);
    }
    builder
        .add_line("请务必避免以上问题，重新创作。")
        .add_blank_line()
}

fn both_lines(builder: PromptBuilder, upper: &str, lower: &str) -> PromptBuilder {
    builder
        .add_section_h2("上下联")
        .add_key_value("上联", upper)
        .add_key_value("下联", lower)
        .add_blank_line()
}

impl PromptCatalog for ClassicCatalog {
    fn topic_analysis(&self, topic: &Topic, length: RequiredLineLength) -> PromptText {
        let system = PromptBuilder::new()
            .add_line(ANALYSIS_SYSTEM)
            .add_blank_line()
            .add_section_h2("核心职责")
            .add_numbered([
                "提取主题的文化内涵和象征意义",
                "识别适合入联的词汇和对仗关系",
                "规划挥春的不同主题侧重",
            ])
            .add_blank_line()
            .add_section_h2("约束条件")
            .add_bullets([
                format!("{}年为{}{}年", self.year.year(), self.year.stem_branch(), self.year.zodiac()),
                "生肖元素仅在自然融入时提供".to_owned(),
                "输出必须为合法JSON，不要包含markdown代码块标记".to_owned(),
            ])
            .finalize();

        let user = PromptBuilder::new()
            .add_line(format_args!(
                "分析主题\"{topic}\"，为{}字春联创作提供结构化指导。",
                length.chars()
            ))
            .add_blank_line()
            .add_section_h2("分析维度")
            .add_numbered([
                "**themeCore**: 主题本质含义（20字以内）",
                "**culturalImagery**: 相关传统文化符号、典故（5-8个）",
                "**zodiacElements**: 生肖相关吉祥寓意（可选）",
                "**emotionalTone**: 情感基调描述（15字以内）",
                "**keyNouns/keyVerbs/keyAdjectives**: 各5-8个适合入联的词汇",
                "**coupletPairs**: 2-3组上下联对仗方向示例",
                "**horizontalDirection**: 横批创作方向（10字以内）",
                "**scrollThemes**: 挥春主题，每个包含主题名和2-3个关键词",
            ])
            .add_blank_line()
            .add_section_h2("输出示例")
            .add_line(
                r#"{"themeCore":"事业发展、职场进取","culturalImagery":["鹏程万里","大展宏图"],"zodiacElements":["马到成功"],"emotionalTone":"积极向上","keyNouns":["事业","宏图"],"keyVerbs":["展","创"],"keyAdjectives":["辉煌","锦绣"],"coupletPairs":[{"upper":"展宏图伟业","lower":"创锦绣前程"}],"horizontalDirection":"事业有成","scrollThemes":[{"theme":"事业腾飞","keywords":["腾飞","发展"]}]}"#,
            )
            .add_blank_line()
            .add_section_h2("输出要求")
            .add_bullets([
                "严格返回JSON格式，不要markdown代码块",
                "数组元素要丰富具体，避免空泛词汇",
                "对仗方向要体现词性和结构的对应关系",
            ])
            .finalize();

        PromptText::new(system, user)
    }

    fn upper_line(&self, ctx: CoupletContext<'_>) -> PromptText {
        let n = ctx.length.chars();
        let builder = PromptBuilder::new()
            .add_line(format_args!("为主题\"{}\"生成{}上联。", ctx.topic, ctx.length.label()))
            .add_blank_line();
        let builder = guidance(builder, &ctx);
        let user = previous_attempt(builder, &ctx)
            .add_section_h2("要求")
            .add_numbered([
                format!("字数严格{n}字"),
                "末字仄声（三/四声）".to_owned(),
                "语言通顺自然".to_owned(),
                "寓意吉祥".to_owned(),
            ])
            .add_blank_line()
            .add_section_h2("输出JSON")
            .add_line(format_args!(r#"{{"upperCouplet":"上联内容（严格{n}字）"}}"#))
            .finalize();

        PromptText::new(UPPER_SYSTEM, user)
    }

    fn lower_line(&self, ctx: CoupletContext<'_>, upper: &str) -> PromptText {
        let n = ctx.length.chars();
        let builder = PromptBuilder::new()
            .add_line(format_args!("根据上联生成{}下联。", ctx.length.label()))
            .add_blank_line()
            .add_key_value("年份信息", self.year)
            .add_blank_line()
            .add_section_h2("上联")
            .add_line(upper)
            .add_blank_line();
        let builder = guidance(builder, &ctx);
        let user = previous_attempt(builder, &ctx)
            .add_section_h2("要求")
            .add_numbered([
                format!("字数严格{n}字"),
                "末字平声（一/二声）".to_owned(),
                "与上联对仗（词性、结构）".to_owned(),
                "意思互补，避免合掌".to_owned(),
            ])
            .add_blank_line()
            .add_section_h2("输出JSON")
            .add_line(format_args!(r#"{{"lowerCouplet":"下联内容（严格{n}字）"}}"#))
            .finalize();

        PromptText::new(LOWER_SYSTEM, user)
    }

    fn review(&self, ctx: CoupletContext<'_>, upper: &str, lower: &str) -> PromptText {
        let user = PromptBuilder::new()
            .add_line(format_args!("审查{}字春联格式。主题：{}", ctx.length.chars(), ctx.topic))
            .add_blank_line()
            .add_section_h2("待审查")
            .add_key_value("上联", upper)
            .add_key_value("下联", lower)
            .add_blank_line()
            .add_section_h2("审查标准（宽松）")
            .add_numbered([
                "通顺自然：语句流畅，符合汉语习惯",
                "对仗基本：词性大致相对，结构大致相应",
            ])
            .add_blank_line()
            .add_section_h2("输出JSON")
            .add_line(r#"{"passed":true,"errors":[{"type":"错误类型","message":"具体描述"}],"suggestions":["改进建议"]}"#)
            .add_blank_line()
            .add_line("注：只要通顺且基本对仗即可通过，不追求完美。")
            .finalize();

        PromptText::new(REVIEW_SYSTEM, user)
    }

    fn election(&self, ctx: CoupletContext<'_>, candidates: &[&CoupletCandidate]) -> PromptText {
        let user = PromptBuilder::new()
            .add_line(format_args!(
                "从{}个候选中为主题\"{}\"选最优。",
                candidates.len(),
                ctx.topic
            ))
            .add_blank_line()
            .add_bullets(
                candidates
                    .iter()
                    .enumerate()
                    .map(|(i, c)| format!("候选{}：{} / {}", i + 1, c.upper_line, c.lower_line)),
            )
            .add_blank_line()
            .add_line(format_args!("要求：字数{}字，通顺对仗。", ctx.length.chars()))
            .add_blank_line()
            .add_line(r#"输出：{"selectedIndex":候选序号（从1开始）,"reason":"理由"}"#)
            .finalize();

        PromptText::new(ELECTION_SYSTEM, user)
    }

    fn banners(&self, ctx: CoupletContext<'_>, upper: &str, lower: &str, count: BannerCount) -> PromptText {
        let n = count.get();
        let builder = PromptBuilder::new()
            .add_line(format_args!("为主题\"{}\"生成{n}个挥春。", ctx.topic))
            .add_blank_line();
        let builder = both_lines(builder, upper, lower);
        let example: Vec<String> = (1..=n).map(|i| format!("\"挥春{i}\"")).collect();
        let user = guidance(builder, &ctx)
            .add_section_h2("要求")
            .add_numbered([
                format!("{n}个挥春，每个严格4字"),
                "吉利喜庆，寓意美好".to_owned(),
                "与主题相关，风格统一".to_owned(),
            ])
            .add_blank_line()
            .add_section_h2("输出JSON")
            .add_line(format_args!(r#"{{"springScrolls":[{}]}}"#, example.join(",")))
            .finalize();

        PromptText::new(format!("生成{n}个挥春。输出JSON。"), user)
    }

    fn horizontal_scroll(&self, ctx: CoupletContext<'_>, upper: &str, lower: &str) -> PromptText {
        let builder = PromptBuilder::new()
            .add_line(format_args!("为主题\"{}\"生成横批。", ctx.topic))
            .add_blank_line()
            .add_key_value("年份信息", self.year)
            .add_blank_line();
        let builder = both_lines(builder, upper, lower);
        let user = guidance(builder, &ctx)
            .add_section_h2("要求")
            .add_numbered([
                "横批严格4字",
                "与上下联内容呼应，统揽全联主题",
                "寓意吉祥，点明主旨",
                "与主题紧密相关",
            ])
            .add_blank_line()
            .add_section_h2("输出JSON")
            .add_line(r#"{"horizontalScroll":"横批内容"}"#)
            .finalize();

        PromptText::new(SCROLL_SYSTEM, user)
    }
}
