use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::keys::get_key_definition;

use crate::error::BrowserError;

/// Key-down and key-up events for one press of `key` (e.g. `"Enter"`).
pub(super) fn key_press(
    key: &str,
) -> Result<(DispatchKeyEventParams, DispatchKeyEventParams), BrowserError> {
    let definition =
        get_key_definition(key).ok_or_else(|| BrowserError::UnsupportedKey(key.to_string()))?;

    let mut builder = DispatchKeyEventParams::builder()
        .key(definition.key)
        .code(definition.code)
        .windows_virtual_key_code(definition.key_code)
        .native_virtual_key_code(definition.key_code);

    // Keys that produce text need a keyDown carrying it; others use rawKeyDown.
    let down_type = if let Some(text) = definition.text {
        builder = builder.text(text);
        DispatchKeyEventType::KeyDown
    } else {
        DispatchKeyEventType::RawKeyDown
    };

    let down = builder
        .clone()
        .r#type(down_type)
        .build()
        .map_err(BrowserError::Input)?;
    let up = builder
        .r#type(DispatchKeyEventType::KeyUp)
        .build()
        .map_err(BrowserError::Input)?;
    Ok((down, up))
}
