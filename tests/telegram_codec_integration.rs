//! Telegram documents as a host would write them

mod common;

use plugin_channels::codec::{
    ChannelConfigChangedTelegram, ExportProperties, RegisterExport, StartExport,
    StartExportAction, Telegram, Timebase, TimebaseType, UpdateConfigTelegram, ValidateExport,
    ValidateExportResponse,
};
use plugin_channels::markup::Version;
use plugin_channels::types::{Interval, Range, Scalar};
use plugin_channels::{PluginError, Property, PropertyType};

const UPDATE_CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<UpdateConfig version="1.1">
  <Extension vendor="acme"/>
  <Channel channel_id="3">
    <Property name="AcquisitionRate"><Scalar unit="Hz">2000</Scalar></Property>
    <Property name="Limits"><Range min_unit="V" max_unit="V"><Min>-1</Min><Max>2</Max></Range></Property>
    <Property name="Notes"><String format="multiline">first
second</String></Property>
    <Property name="Enabled"><Boolean>true</Boolean></Property>
  </Channel>
</UpdateConfig>"#;

#[test]
fn test_host_update_config_document() {
    let telegram = UpdateConfigTelegram::from_markup(UPDATE_CONFIG).unwrap();
    assert_eq!(telegram.channels.len(), 1);
    let properties = &telegram.channels[0].properties;
    assert_eq!(telegram.channels[0].channel_id, 3);

    let rate = properties.get_scalar("AcquisitionRate").unwrap();
    assert_eq!(rate, Scalar::new(2000.0, "Hz"));
    common::assert_float_eq(rate.value, 2000.0, 1e-12);

    let limits = properties.get_range("Limits").unwrap();
    assert_eq!(limits, Range::new(-1.0, 2.0, "V"));
    assert!(limits.is_valid());

    assert_eq!(properties.get_string("Notes"), "first\nsecond");
    assert!(properties.get_bool("Enabled").unwrap());
    assert_eq!(properties.get_string("Enabled"), "true");
}

#[test]
fn test_missing_version_assumes_current() {
    let text = r#"<UpdateConfig><Channel channel_id="1"/></UpdateConfig>"#;
    let telegram = UpdateConfigTelegram::from_markup(text).unwrap();
    assert_eq!(telegram.channel_ids().into_iter().collect::<Vec<_>>(), vec![1]);

    let root = telegram.to_markup(Version::new(1, 0)).unwrap();
    assert_eq!(root.attr("version"), Some("1.0"));
}

#[test]
fn test_generate_is_deterministic() {
    let telegram = UpdateConfigTelegram::from_markup(UPDATE_CONFIG).unwrap();
    let first = telegram.generate().unwrap();
    let reparsed = UpdateConfigTelegram::from_markup(&first).unwrap();
    assert_eq!(reparsed, telegram);
    assert_eq!(reparsed.generate().unwrap(), first);
}

#[test]
fn test_parse_failure_keeps_previous_value() {
    let mut telegram = UpdateConfigTelegram::from_markup(UPDATE_CONFIG).unwrap();
    let before = telegram.clone();
    assert!(!telegram.parse("<UpdateConfig><Channel/></UpdateConfig>"));
    assert!(!telegram.parse("<Timebase/>"));
    assert_eq!(telegram, before);

    assert!(telegram.parse("<UpdateConfig/>"));
    assert!(telegram.channels.is_empty());
}

#[test]
fn test_input_config_defaults() {
    let text = r#"<ChannelConfigChanged version="1.1">
        <Channel channel_id="10"/>
        <Channel channel_id="11" valid="false">
            <Property name="Gain"><Double>0.5</Double></Property>
        </Channel>
    </ChannelConfigChanged>"#;
    let telegram = ChannelConfigChangedTelegram::from_markup(text).unwrap();
    assert!(telegram.channels[0].valid);
    assert!(!telegram.channels[1].valid);
    let gain = telegram.channels[1].properties.get("Gain").unwrap();
    assert_eq!(gain.kind(), PropertyType::FloatingPointNumber);
}

#[test]
fn test_timebase_document() {
    let mut timebase = Timebase::default();
    assert!(timebase.parse(r#"<Timebase version="1.1" type="simple" frequency="48000"/>"#));
    assert_eq!(timebase.kind, TimebaseType::Simple);
    assert_eq!(timebase.frequency, 48000.0);

    assert!(!timebase.parse(r#"<Timebase type="simple"/>"#));
    assert_eq!(timebase, Timebase::simple(48000.0));
}

fn export_selection() -> ExportProperties {
    let mut custom = plugin_channels::PropertyList::new();
    custom.set(Property::new("Delimiter", ";"));
    ExportProperties {
        channels: vec![4, 9],
        export_intervals: vec![Interval::new(0.0, 1.5), Interval::new(10.0, 12.25)],
        filename: "/tmp/out.csv".to_string(),
        format_id: "csv".to_string(),
        custom_properties: custom,
    }
}

#[test]
fn test_export_flow() {
    let register = RegisterExport {
        format_name: "Comma separated".to_string(),
        format_id: "csv".to_string(),
        file_extension: "csv".to_string(),
        ui_item_small: "export_small".to_string(),
        ui_item_full: "export_full".to_string(),
        start_export_action: StartExportAction::SelectDirectory,
    };
    let parsed = RegisterExport::from_markup(&register.generate().unwrap()).unwrap();
    assert_eq!(parsed, register);

    let validate = ValidateExport {
        properties: export_selection(),
    };
    let parsed = ValidateExport::from_markup(&validate.generate().unwrap()).unwrap();
    assert_eq!(parsed.properties, export_selection());

    let start = StartExport {
        transaction_id: 17,
        properties: export_selection(),
    };
    let parsed = StartExport::from_markup(&start.generate().unwrap()).unwrap();
    assert_eq!(parsed, start);

    let response = ValidateExportResponse::default();
    let parsed = ValidateExportResponse::from_markup(&response.generate().unwrap()).unwrap();
    assert_eq!(parsed, response);
}

#[test]
fn test_start_export_requires_transaction_id() {
    let start = StartExport {
        transaction_id: 0,
        properties: export_selection(),
    };
    assert!(matches!(
        start.generate(),
        Err(PluginError::InvariantViolation(_))
    ));
}
