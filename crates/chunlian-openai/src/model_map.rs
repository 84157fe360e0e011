use std::borrow::Cow;

use chunlian_core::model::Model;

/// Wire id for `model`, or `None` when it cannot be sent.
pub(crate) fn map_model(model: &Model) -> Option<Cow<'static, str>> {
    match model {
        Model::OpenAi(openai_model) => Some(Cow::Borrowed(openai_model.id())),
        Model::Custom(custom) if custom.trim().is_empty() => None,
        Model::Custom(custom) => Some(Cow::Owned(custom.clone())),
    }
}
