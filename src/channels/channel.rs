//! Plugin output channels.

use super::listener::ChannelChangeListener;
use crate::codec::{
    ChannelDataformat, PluginChannelInfo, SampleFormat, SampleOccurrence, Timebase,
};
use crate::error::{PluginError, Result};
use crate::property::{Property, PropertyList, PropertyType};
use crate::types::Range;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared handle to a channel owned by a registry
pub type PluginChannelPtr = Rc<RefCell<PluginChannel>>;

/// Property keys that map onto channel fields instead of the property list
pub mod keys {
    pub const NAME: &str = "Name";
    pub const UNIT: &str = "Unit";
    pub const RANGE: &str = "Range";
    pub const USED: &str = "Used";
}

/// A data stream exposed by the plugin
pub struct PluginChannel {
    info: PluginChannelInfo,
    parent: Weak<RefCell<PluginChannel>>,
    owner_task: Option<u64>,
    listener: Option<Rc<dyn ChannelChangeListener>>,
}

impl std::fmt::Debug for PluginChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginChannel")
            .field("local_id", &self.info.local_id)
            .field("name", &self.info.default_name)
            .field("owner_task", &self.owner_task)
            .finish()
    }
}

impl PluginChannel {
    /// A detached channel. Channels created through the registry are
    /// wired to its change tracking.
    pub fn new(local_id: u32) -> Self {
        Self {
            info: PluginChannelInfo::new(local_id),
            parent: Weak::new(),
            owner_task: None,
            listener: None,
        }
    }

    pub(crate) fn set_change_listener(&mut self, listener: Option<Rc<dyn ChannelChangeListener>>) {
        self.listener = listener;
    }

    fn setup_changed(&self) {
        if let Some(listener) = &self.listener {
            listener.on_channel_setup_changed(self.info.local_id);
        }
    }

    fn property_changed(&self, name: &str) {
        if let Some(listener) = &self.listener {
            listener.on_channel_property_changed(self.info.local_id, name);
        }
    }

    // ── Setup ──

    pub fn set_sample_format(
        &mut self,
        occurrence: SampleOccurrence,
        format: SampleFormat,
        dimension: u32,
    ) -> &mut Self {
        let dataformat = ChannelDataformat::new(occurrence, format, dimension);
        if self.info.dataformat != dataformat {
            self.info.dataformat = dataformat;
            self.setup_changed();
        }
        self
    }

    pub fn set_simple_timebase(&mut self, frequency: f64) -> &mut Self {
        let timebase = Timebase::simple(frequency);
        if self.info.timebase != timebase {
            self.info.timebase = timebase;
            self.setup_changed();
        }
        self
    }

    pub fn set_default_name(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if self.info.default_name != name {
            self.info.default_name = name;
            self.setup_changed();
        }
        self
    }

    pub fn set_domain(&mut self, domain: impl Into<String>) -> &mut Self {
        let domain = domain.into();
        if self.info.domain != domain {
            self.info.domain = domain;
            self.setup_changed();
        }
        self
    }

    pub fn set_deletable(&mut self, deletable: bool) -> &mut Self {
        if self.info.deletable != deletable {
            self.info.deletable = deletable;
            self.setup_changed();
        }
        self
    }

    pub fn set_valid(&mut self, valid: bool) -> &mut Self {
        if self.info.valid != valid {
            self.info.valid = valid;
            self.setup_changed();
        }
        self
    }

    /// Link to a parent channel; `None` makes this a root channel.
    ///
    /// A channel cannot parent itself. Called through the channel's own
    /// handle, `parent` is mutably borrowed and the link is refused.
    pub fn set_local_parent(&mut self, parent: Option<&PluginChannelPtr>) -> &mut Self {
        let parent_id = match parent.map(|p| p.try_borrow().map(|p| p.local_id())) {
            None => None,
            Some(Ok(id)) if id != self.info.local_id => Some(id),
            Some(_) => {
                tracing::warn!("Channel {} cannot be its own parent", self.info.local_id);
                return self;
            }
        };
        if self.local_parent_id() != parent_id {
            self.parent = parent.map(Rc::downgrade).unwrap_or_default();
            self.info.local_parent_id = parent_id;
            self.setup_changed();
        }
        self
    }

    /// Add a property or replace the one with the same name
    pub fn add_property(&mut self, property: Property) -> &mut Self {
        self.info.properties.set(property);
        self.setup_changed();
        self
    }

    // ── Property values ──

    pub fn set_range(&mut self, range: Range) -> &mut Self {
        if self.info.range != range {
            self.info.range = range;
            self.property_changed(keys::RANGE);
        }
        self
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) -> &mut Self {
        let unit = unit.into();
        if self.info.unit != unit {
            self.info.unit = unit;
            self.property_changed(keys::UNIT);
        }
        self
    }

    /// Change the value of an existing property
    pub fn set_property_value(&mut self, property: Property) -> Result<&mut Self> {
        self.check_property(&property)?;
        self.apply_property(property);
        Ok(self)
    }

    /// Verify that `property` may be applied: special keys need their
    /// fixed kind, other properties must exist with the same kind.
    pub(crate) fn check_property(&self, property: &Property) -> Result<()> {
        let expected = match property.name() {
            keys::NAME | keys::UNIT => PropertyType::String,
            keys::RANGE => PropertyType::Range,
            keys::USED => PropertyType::Boolean,
            name => match self.info.properties.get(name) {
                Some(existing) => existing.kind(),
                None => {
                    return Err(PluginError::AbsentValue(format!(
                        "channel {} has no property '{}'",
                        self.info.local_id, name
                    )))
                }
            },
        };
        if property.kind() != expected {
            return Err(PluginError::type_mismatch(
                property.name(),
                expected,
                property.kind(),
            ));
        }
        Ok(())
    }

    /// Apply a property already accepted by `check_property`
    pub(crate) fn apply_property(&mut self, property: Property) {
        match property.name() {
            keys::NAME => {
                self.set_default_name(property.get_string_value());
            }
            keys::UNIT => {
                self.set_unit(property.get_string_value());
            }
            keys::RANGE => {
                if let Ok(range) = property.get_range_value() {
                    self.set_range(range);
                }
            }
            keys::USED => {
                if let Ok(used) = property.get_bool_value() {
                    self.set_valid(used);
                }
            }
            name => {
                let name = name.to_string();
                if let Some(existing) = self.info.properties.get_mut(&name) {
                    if !existing.same_value(&property) {
                        *existing = property;
                        self.property_changed(&name);
                    }
                }
            }
        }
    }

    // ── Getters ──

    pub fn local_id(&self) -> u32 {
        self.info.local_id
    }

    pub fn default_name(&self) -> &str {
        &self.info.default_name
    }

    pub fn domain(&self) -> &str {
        &self.info.domain
    }

    pub fn dataformat(&self) -> ChannelDataformat {
        self.info.dataformat
    }

    pub fn timebase(&self) -> Timebase {
        self.info.timebase
    }

    pub fn is_deletable(&self) -> bool {
        self.info.deletable
    }

    /// The channel's own validity flag (see `PluginTask::is_valid` for the
    /// combined state reported to the host)
    pub fn is_valid(&self) -> bool {
        self.info.valid
    }

    pub fn range(&self) -> &Range {
        &self.info.range
    }

    pub fn unit(&self) -> &str {
        &self.info.unit
    }

    pub fn local_parent(&self) -> Option<PluginChannelPtr> {
        self.parent.upgrade()
    }

    /// Parent id, `None` for root channels or when the parent is gone
    pub fn local_parent_id(&self) -> Option<u32> {
        self.parent.upgrade().map(|p| p.borrow().local_id())
    }

    /// Task that owns this channel as an output
    pub fn owner_task(&self) -> Option<u64> {
        self.owner_task
    }

    pub(crate) fn set_owner_task(&mut self, task: Option<u64>) {
        self.owner_task = task;
    }

    pub fn properties(&self) -> &PropertyList {
        &self.info.properties
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.info.properties.get(name)
    }

    /// Current value of a property, special keys included
    pub fn property_snapshot(&self, name: &str) -> Option<Property> {
        match name {
            keys::NAME => Some(Property::new(name, self.info.default_name.clone())),
            keys::UNIT => Some(Property::new(name, self.info.unit.clone())),
            keys::RANGE => Some(Property::new(name, self.info.range.clone())),
            keys::USED => Some(Property::new(name, self.info.valid)),
            _ => self.info.properties.get(name).cloned(),
        }
    }

    /// Description sent to the host; `valid` is the combined validity
    pub(crate) fn to_info(&self, valid: bool) -> PluginChannelInfo {
        let mut info = self.info.clone();
        info.local_parent_id = self.local_parent_id();
        info.valid = valid;
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::listener::SyncState;

    fn tracked(local_id: u32) -> (PluginChannel, Rc<SyncState>) {
        let state = Rc::new(SyncState::new());
        let mut channel = PluginChannel::new(local_id);
        channel.set_change_listener(Some(state.clone()));
        (channel, state)
    }

    #[test]
    fn test_chainable_setup() {
        let (mut channel, state) = tracked(3);
        channel
            .set_default_name("Replay channel")
            .set_sample_format(SampleOccurrence::Sync, SampleFormat::Double, 1)
            .set_simple_timebase(1000.0)
            .set_deletable(true)
            .add_property(Property::new("InputFile", "data.csv"));

        assert_eq!(channel.default_name(), "Replay channel");
        assert_eq!(channel.timebase(), Timebase::simple(1000.0));
        assert!(channel.is_deletable());
        assert!(channel.property("InputFile").is_some());
        assert!(state.is_topology_dirty());
        assert!(state.dirty_property_channels().is_empty());
    }

    #[test]
    fn test_property_edit_is_not_structural() {
        let (mut channel, state) = tracked(5);
        channel.add_property(Property::new("Gain", 1.0));
        state.clear_topology();

        channel.set_property_value(Property::new("Gain", 2.0)).unwrap();
        channel.set_unit("mV").set_range(Range::new(-1.0, 1.0, "mV"));

        assert!(!state.is_topology_dirty());
        let names: Vec<_> = state.dirty_properties(5).into_iter().collect();
        assert_eq!(names, vec!["Gain", "Range", "Unit"]);
    }

    #[test]
    fn test_unchanged_values_do_not_notify() {
        let (mut channel, state) = tracked(1);
        channel.set_simple_timebase(10.0).add_property(Property::new("Gain", 1.0));
        state.clear_topology();

        channel.set_simple_timebase(10.0).set_valid(true);
        channel.set_property_value(Property::new("Gain", 1.0)).unwrap();
        assert!(!state.is_topology_dirty());
        assert!(state.dirty_property_channels().is_empty());
    }

    #[test]
    fn test_property_checks() {
        let (mut channel, _state) = tracked(1);
        channel.add_property(Property::new("Gain", 1.0));

        assert!(matches!(
            channel.set_property_value(Property::new("Gain", "two")),
            Err(PluginError::TypeMismatch { .. })
        ));
        assert!(matches!(
            channel.set_property_value(Property::new("Missing", 1.0)),
            Err(PluginError::AbsentValue(_))
        ));
        assert!(channel.set_property_value(Property::new(keys::USED, 1i32)).is_err());
        assert_eq!(channel.property("Gain").unwrap().get_double_value().unwrap(), 1.0);
    }

    #[test]
    fn test_special_keys() {
        let (mut channel, _state) = tracked(1);
        channel
            .set_property_value(Property::new(keys::NAME, "Renamed"))
            .unwrap()
            .set_property_value(Property::new(keys::USED, false))
            .unwrap();
        assert_eq!(channel.default_name(), "Renamed");
        assert!(!channel.is_valid());
        assert_eq!(
            channel.property_snapshot(keys::USED),
            Some(Property::new(keys::USED, false))
        );
    }

    #[test]
    fn test_self_parenting_is_refused() {
        let state = Rc::new(SyncState::new());
        let channel = Rc::new(RefCell::new(PluginChannel::new(4)));
        channel.borrow_mut().set_change_listener(Some(state.clone()));

        channel.borrow_mut().set_local_parent(Some(&channel));
        assert_eq!(channel.borrow().local_parent_id(), None);
        assert!(!state.is_topology_dirty());

        // same id through another handle
        let twin = Rc::new(RefCell::new(PluginChannel::new(4)));
        channel.borrow_mut().set_local_parent(Some(&twin));
        assert!(channel.borrow().local_parent().is_none());
    }

    #[test]
    fn test_parent_link_is_weak() {
        let parent = Rc::new(RefCell::new(PluginChannel::new(0)));
        let (mut child, state) = tracked(1);
        child.set_local_parent(Some(&parent));
        assert_eq!(child.local_parent_id(), Some(0));
        assert!(state.is_topology_dirty());

        drop(parent);
        assert!(child.local_parent().is_none());
        assert_eq!(child.to_info(true).local_parent_id, None);
    }
}
