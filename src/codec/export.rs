//! Export plugin telegrams.
//!
//! An export plugin registers a file format once ([`RegisterExport`]).
//! The host then asks it to check a selection ([`ValidateExport`], answered
//! by [`ValidateExportResponse`]) and finally to write it ([`StartExport`]).
//! Both requests carry the same [`ExportProperties`] block:
//!
//! ```text
//! <ExportProperties>
//!   <Channels><Channel id="1"/><Channel id="2"/></Channels>
//!   <Intervals><Interval begin="0" end="10.5"/></Intervals>
//!   <Filename>/tmp/out.csv</Filename>
//!   <FormatId>csv</FormatId>
//!   <CustomProperties><Property name="Delimiter"><String>;</String></Property></CustomProperties>
//! </ExportProperties>
//! ```

use super::Telegram;
use crate::error::{PluginError, Result};
use crate::markup::format::format_f64;
use crate::markup::{MarkupNode, Version};
use crate::property::PropertyList;
use crate::types::Interval;

/// What the host asks the user for before starting an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartExportAction {
    #[default]
    SelectFile,
    SelectDirectory,
    None,
}

impl StartExportAction {
    pub fn as_str(self) -> &'static str {
        match self {
            StartExportAction::SelectFile => "select_file",
            StartExportAction::SelectDirectory => "select_directory",
            StartExportAction::None => "none",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "select_file" => Some(StartExportAction::SelectFile),
            "select_directory" => Some(StartExportAction::SelectDirectory),
            "none" => Some(StartExportAction::None),
            _ => None,
        }
    }
}

/// Announces an export file format to the host
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegisterExport {
    pub format_name: String,
    pub format_id: String,
    pub file_extension: String,
    pub ui_item_small: String,
    pub ui_item_full: String,
    pub start_export_action: StartExportAction,
}

impl Telegram for RegisterExport {
    const ROOT: &'static str = "RegisterExport";

    fn decode(root: &MarkupNode, _version: Version) -> Result<Self> {
        let format = root
            .child("Format")
            .ok_or_else(|| PluginError::Parse("<RegisterExport> has no <Format>".to_string()))?;
        let mut telegram = Self {
            format_name: format.attr("name").unwrap_or_default().to_string(),
            format_id: format.attr("id").unwrap_or_default().to_string(),
            file_extension: format.attr("extension").unwrap_or_default().to_string(),
            ..Default::default()
        };
        if let Some(ui) = root.child("UiItems") {
            telegram.ui_item_small = ui.attr("small").unwrap_or_default().to_string();
            telegram.ui_item_full = ui.attr("full").unwrap_or_default().to_string();
        }
        if let Some(action) = root.child("StartExportAction") {
            let name = action.text().trim();
            telegram.start_export_action = StartExportAction::from_name(name).ok_or_else(|| {
                PluginError::Parse(format!("unknown start export action '{}'", name))
            })?;
        }
        Ok(telegram)
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        root.append("Format")
            .set_attr("name", &self.format_name)
            .set_attr("id", &self.format_id)
            .set_attr("extension", &self.file_extension);
        root.append("UiItems")
            .set_attr("small", &self.ui_item_small)
            .set_attr("full", &self.ui_item_full);
        root.append("StartExportAction")
            .set_text(self.start_export_action.as_str());
        Ok(())
    }
}

/// Channel selection, time ranges and options of one export
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportProperties {
    pub channels: Vec<u64>,
    pub export_intervals: Vec<Interval<f64>>,
    pub filename: String,
    pub format_id: String,
    pub custom_properties: PropertyList,
}

impl ExportProperties {
    /// Read from an `<ExportProperties>` element embedded in another telegram
    pub fn parse_node(&mut self, node: &MarkupNode) -> bool {
        match Self::decode(node, Version::CURRENT) {
            Ok(parsed) => {
                *self = parsed;
                true
            }
            Err(e) => {
                tracing::debug!("Failed to parse <ExportProperties>: {}", e);
                false
            }
        }
    }

    /// Standalone `<ExportProperties>` element
    pub fn to_node(&self) -> MarkupNode {
        let mut node = MarkupNode::new(Self::ROOT);
        self.write(&mut node);
        node
    }

    /// Markup without declaration, for embedding in another document
    pub fn generate_node_markup(&self) -> Result<String> {
        self.to_node().to_fragment()
    }

    fn write(&self, node: &mut MarkupNode) {
        let channels = node.append("Channels");
        for id in &self.channels {
            channels.append("Channel").set_attr("id", id);
        }
        let intervals = node.append("Intervals");
        for interval in &self.export_intervals {
            intervals
                .append("Interval")
                .set_attr("begin", format_f64(interval.begin))
                .set_attr("end", format_f64(interval.end));
        }
        node.append("Filename").set_text(self.filename.clone());
        node.append("FormatId").set_text(self.format_id.clone());
        self.custom_properties
            .append_to(node.append("CustomProperties"));
    }
}

impl Telegram for ExportProperties {
    const ROOT: &'static str = "ExportProperties";

    fn decode(root: &MarkupNode, version: Version) -> Result<Self> {
        let mut properties = Self::default();
        if let Some(channels) = root.child("Channels") {
            properties.channels = channels
                .children_named("Channel")
                .map(|c| c.required_attr("id"))
                .collect::<Result<_>>()?;
        }
        if let Some(intervals) = root.child("Intervals") {
            properties.export_intervals = intervals
                .children_named("Interval")
                .map(|i| -> Result<Interval<f64>> {
                    Ok(Interval::new(i.required_attr("begin")?, i.required_attr("end")?))
                })
                .collect::<Result<_>>()?;
        }
        if let Some(filename) = root.child("Filename") {
            properties.filename = filename.text().to_string();
        }
        if let Some(format_id) = root.child("FormatId") {
            properties.format_id = format_id.text().to_string();
        }
        if let Some(custom) = root.child("CustomProperties") {
            properties.custom_properties = PropertyList::from_markup(custom, version)?;
        }
        Ok(properties)
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        self.write(root);
        Ok(())
    }
}

fn read_export_properties(root: &MarkupNode, version: Version) -> Result<ExportProperties> {
    match root.child(ExportProperties::ROOT) {
        Some(node) => ExportProperties::decode(node, version),
        None => Ok(ExportProperties::default()),
    }
}

/// Request to write an export
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartExport {
    /// Must be nonzero when generated
    pub transaction_id: u64,
    pub properties: ExportProperties,
}

impl Telegram for StartExport {
    const ROOT: &'static str = "StartExport";

    fn decode(root: &MarkupNode, version: Version) -> Result<Self> {
        Ok(Self {
            transaction_id: root.attr_as("transaction_id")?.unwrap_or_default(),
            properties: read_export_properties(root, version)?,
        })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        if self.transaction_id == 0 {
            return Err(PluginError::InvariantViolation(
                "StartExport requires a nonzero transaction id".to_string(),
            ));
        }
        root.set_attr("transaction_id", self.transaction_id);
        root.append_child(self.properties.to_node());
        Ok(())
    }
}

/// Request to check an export selection without writing it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidateExport {
    pub properties: ExportProperties,
}

impl Telegram for ValidateExport {
    const ROOT: &'static str = "ValidateExport";

    fn decode(root: &MarkupNode, version: Version) -> Result<Self> {
        Ok(Self {
            properties: read_export_properties(root, version)?,
        })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        root.append_child(self.properties.to_node());
        Ok(())
    }
}

/// A problem with one channel of an export selection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelError {
    pub channel_id: u64,
    pub error_code: u64,
    pub error_message: String,
}

impl ChannelError {
    pub fn new(channel_id: u64, error_code: u64) -> Self {
        Self {
            channel_id,
            error_code,
            error_message: String::new(),
        }
    }

    pub fn with_message(channel_id: u64, error_code: u64, message: impl Into<String>) -> Self {
        Self {
            channel_id,
            error_code,
            error_message: message.into(),
        }
    }

    fn read(node: &MarkupNode) -> Result<Self> {
        Ok(Self {
            channel_id: node.required_attr("channel_id")?,
            error_code: node.attr_as("error_code")?.unwrap_or_default(),
            error_message: node.text().to_string(),
        })
    }

    fn write(&self, parent: &mut MarkupNode) {
        parent
            .append("ChannelError")
            .set_attr("channel_id", self.channel_id)
            .set_attr("error_code", self.error_code)
            .set_text(self.error_message.clone());
    }
}

/// Answer to [`ValidateExport`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidateExportResponse {
    pub success: bool,
    pub channel_errors: Vec<ChannelError>,
    pub channel_warnings: Vec<ChannelError>,
}

impl Telegram for ValidateExportResponse {
    const ROOT: &'static str = "ValidateExportResponse";

    fn decode(root: &MarkupNode, _version: Version) -> Result<Self> {
        let read_group = |name: &str| -> Result<Vec<ChannelError>> {
            match root.child(name) {
                Some(group) => group
                    .children_named("ChannelError")
                    .map(ChannelError::read)
                    .collect(),
                None => Ok(Vec::new()),
            }
        };
        let success = match root.attr("success") {
            Some(text) => crate::property::parse_bool(text)
                .ok_or_else(|| PluginError::Parse(format!("'{}' is not a boolean", text)))?,
            None => false,
        };
        Ok(Self {
            success,
            channel_errors: read_group("Errors")?,
            channel_warnings: read_group("Warnings")?,
        })
    }

    fn encode(&self, root: &mut MarkupNode) -> Result<()> {
        root.set_attr("success", self.success);
        let errors = root.append("Errors");
        for error in &self.channel_errors {
            error.write(errors);
        }
        let warnings = root.append("Warnings");
        for warning in &self.channel_warnings {
            warning.write(warnings);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;

    fn sample_properties() -> ExportProperties {
        let mut custom = PropertyList::new();
        custom.set_string("Delimiter", ";");
        custom.set_bool("Header", true);
        ExportProperties {
            channels: vec![1, 2, 300],
            export_intervals: vec![Interval::new(0.0, 10.5), Interval::new(20.0, f64::INFINITY)],
            filename: "/tmp/out file.csv".to_string(),
            format_id: "csv".to_string(),
            custom_properties: custom,
        }
    }

    #[test]
    fn test_register_export_round_trip() {
        let telegram = RegisterExport {
            format_name: "Comma separated".to_string(),
            format_id: "csv".to_string(),
            file_extension: "csv".to_string(),
            ui_item_small: "<Item/>".to_string(),
            ui_item_full: String::new(),
            start_export_action: StartExportAction::SelectDirectory,
        };
        let parsed = RegisterExport::from_markup(&telegram.generate().unwrap()).unwrap();
        assert_eq!(parsed, telegram);
    }

    #[test]
    fn test_register_export_requires_format() {
        let mut telegram = RegisterExport::default();
        assert!(!telegram.parse(r#"<RegisterExport version="1.1"/>"#));
    }

    #[test]
    fn test_start_export_zero_transaction_fails() {
        let telegram = StartExport {
            transaction_id: 0,
            properties: sample_properties(),
        };
        assert!(matches!(
            telegram.generate(),
            Err(PluginError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_start_export_round_trip() {
        let telegram = StartExport {
            transaction_id: 17,
            properties: sample_properties(),
        };
        let text = telegram.generate().unwrap();
        assert!(text.contains(r#"transaction_id="17""#));

        let mut parsed = StartExport::default();
        assert!(parsed.parse(&text));
        assert_eq!(parsed, telegram);
        assert_eq!(
            parsed.properties.custom_properties.get("Header"),
            Some(&Property::new("Header", true))
        );
    }

    #[test]
    fn test_validate_export_round_trip() {
        let telegram = ValidateExport {
            properties: sample_properties(),
        };
        let parsed = ValidateExport::from_markup(&telegram.generate().unwrap()).unwrap();
        assert_eq!(parsed, telegram);
    }

    #[test]
    fn test_node_markup_embeds() {
        let properties = sample_properties();
        let fragment = properties.generate_node_markup().unwrap();
        assert!(fragment.starts_with("<ExportProperties>"));

        let wrapped = format!("<Outer>{}</Outer>", fragment);
        let outer = MarkupNode::parse(&wrapped).unwrap();
        let mut parsed = ExportProperties::default();
        assert!(parsed.parse_node(outer.child("ExportProperties").unwrap()));
        assert_eq!(parsed, properties);
    }

    #[test]
    fn test_export_properties_missing_sections_default() {
        let parsed = ExportProperties::from_markup(r#"<ExportProperties version="1.1"><Filename>a</Filename></ExportProperties>"#).unwrap();
        assert!(parsed.channels.is_empty());
        assert_eq!(parsed.filename, "a");
        assert!(parsed.custom_properties.is_empty());
    }

    #[test]
    fn test_validate_export_response_round_trip() {
        let telegram = ValidateExportResponse {
            success: false,
            channel_errors: vec![ChannelError::with_message(4, 0x8000_0003, "unsupported & odd")],
            channel_warnings: vec![ChannelError::new(5, 1)],
        };
        let parsed = ValidateExportResponse::from_markup(&telegram.generate().unwrap()).unwrap();
        assert_eq!(parsed, telegram);
    }
}
