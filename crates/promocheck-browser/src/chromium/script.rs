//! In-page DOM readers.
//!
//! Each expression wraps its answer in `JSON.stringify` so the protocol
//! always hands back a plain string, including for `null`.

/// Expression yielding `"true"` or `"false"` for whether `selector` matches.
pub(super) fn element_exists(selector: &str) -> Result<String, serde_json::Error> {
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        "JSON.stringify(document.querySelector({selector}) !== null)"
    ))
}

/// Expression yielding the trimmed text of the first match, or `"null"`.
pub(super) fn text_content(selector: &str) -> Result<String, serde_json::Error> {
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        "JSON.stringify((() => {{ const el = document.querySelector({selector}); \
         return el ? el.textContent.trim() : null; }})())"
    ))
}
