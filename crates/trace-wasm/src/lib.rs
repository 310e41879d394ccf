use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use trace_core::{ConfigError, MarginSide, Processor, ProcessorConfig};

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessOptions {
    class_prefix: Option<String>,
    interactive: Option<bool>,
    marginalia: Option<bool>,
    extensions: Option<bool>,
    marginalia_side: Option<MarginSide>,
    sanitize: Option<bool>,
    scan_limit: Option<usize>,
}

#[wasm_bindgen]
pub fn find_pattern(text: &str, trigger: &str, section_count: usize) -> Result<JsValue, JsValue> {
    to_js(&trace_core::find_pattern(text, trigger, section_count))
}

#[wasm_bindgen]
pub fn find_interactive_markers(text: &str) -> Result<JsValue, JsValue> {
    to_js(&trace_core::find_interactive_markers(text))
}

#[wasm_bindgen]
pub fn find_marginalia_patterns(text: &str) -> Result<JsValue, JsValue> {
    to_js(&trace_core::find_marginalia_patterns(text))
}

#[wasm_bindgen]
pub fn find_paragraph_extensions(text: &str) -> Result<JsValue, JsValue> {
    to_js(&trace_core::find_paragraph_extensions(text))
}

#[wasm_bindgen]
pub fn validate_pattern(text: &str, trigger: &str) -> Result<JsValue, JsValue> {
    to_js(&trace_core::validate_pattern(text, trigger))
}

/// `options` may be `null` or `undefined` for the defaults.
#[wasm_bindgen]
pub fn process_html(text: &str, options: JsValue) -> Result<JsValue, JsValue> {
    let config = config_from_js(options)?;
    to_js(&Processor::new(config).process(text))
}

fn config_from_js(value: JsValue) -> Result<ProcessorConfig, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(ProcessorConfig::default());
    }
    let parsed: ProcessOptions =
        serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
    parsed
        .into_config()
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

impl ProcessOptions {
    fn into_config(self) -> Result<ProcessorConfig, ConfigError> {
        let mut out = ProcessorConfig::default();
        if let Some(class_prefix) = self.class_prefix {
            out.class_prefix = class_prefix;
        }
        if let Some(interactive) = self.interactive {
            out.interactive = interactive;
        }
        if let Some(marginalia) = self.marginalia {
            out.marginalia = marginalia;
        }
        if let Some(extensions) = self.extensions {
            out.extensions = extensions;
        }
        if let Some(side) = self.marginalia_side {
            out.marginalia_side = side;
        }
        if let Some(sanitize) = self.sanitize {
            out.sanitize = sanitize;
        }
        if let Some(scan_limit) = self.scan_limit {
            out.scan_limit = scan_limit;
        }
        out.validate()?;
        Ok(out)
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}
