//! User-safe messages for gateway rejections.
//!
//! Only a small allow-list of provider error codes maps to an actionable
//! message; everything recognizable but non-actionable collapses into a
//! generic retry line so provider internals never reach the user.

/// Generic retry line used for credential problems, unsupported requests and
/// transport failures.
pub const GENERIC_RETRY: &str =
    "Não foi possível processar o pagamento agora. Tente novamente em instantes.";

/// High-risk decline: suggest another rail.
pub const TRY_ANOTHER_METHOD: &str =
    "Pagamento recusado pelo emissor. Tente outro cartão ou pague via Pix.";

/// Payer data problems are fixable by the user.
pub const CHECK_PAYER_DATA: &str =
    "Confira os dados do pagador (nome, documento e e-mail) e tente novamente.";

/// Map a provider error code to the message shown to the user. Unmatched
/// codes fall back to the provider's own message.
pub fn user_message(code: &str, provider_message: &str) -> String {
    let code = code.to_ascii_lowercase();
    if code.contains("unauthorized") || code.contains("invalid_token") || code.contains("credential")
    {
        return GENERIC_RETRY.to_string();
    }
    if code.contains("high_risk") {
        return TRY_ANOTHER_METHOD.to_string();
    }
    if code.contains("payer") {
        return CHECK_PAYER_DATA.to_string();
    }
    if code.contains("unsupported") || code.contains("not_supported") {
        return GENERIC_RETRY.to_string();
    }
    provider_message.to_string()
}
