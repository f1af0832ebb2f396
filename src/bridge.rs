//! Homie-style property bridge over any [`MqttClient`].
//!
//! Maps the node's named properties onto MQTT topics:
//!
//! ```text
//! {prefix}/{device_id}/{node_id}/{property}          value
//! {prefix}/{device_id}/{node_id}/{property}/$name    attribute (retained)
//! {prefix}/{device_id}/{node_id}/{property}/$datatype
//! {prefix}/{device_id}/{node_id}/{property}/$format
//! {prefix}/{device_id}/{node_id}/{property}/$settable
//! {prefix}/{device_id}/{node_id}/{property}/set      writes (subscribed)
//! {prefix}/{device_id}/{node_id}/$properties         advertised ids (retained)
//! ```
//!
//! # Example
//!
//! ```rust
//! use mmwave_occupancy::bridge::PropertyBridge;
//! use mmwave_occupancy::config::Config;
//! use mmwave_occupancy::hal::MockMqtt;
//! use mmwave_occupancy::traits::PropertyPublisher;
//!
//! let config = Config::default();
//! let mut bridge = PropertyBridge::new(MockMqtt::new(), &config);
//! bridge.publish("motion", "ON", true).unwrap();
//!
//! let sent = bridge.client().published_to("homie/occupancy-1/Occupancy/motion");
//! assert_eq!(sent.len(), 1);
//! ```

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use log::{debug, warn};

use crate::config::Config;
use crate::node::NodeLifecycle;
use crate::traits::{MqttClient, PropertyPublisher, PropertySpec};

/// Suffix of the topic a settable property receives writes on.
pub const SET_SUFFIX: &str = "/set";

/// [`PropertyPublisher`] implementation on top of an MQTT client.
pub struct PropertyBridge<C: MqttClient> {
    client: C,
    node_topic: String,
    properties: Vec<String>,
    settable: Vec<String>,
}

impl<C: MqttClient> PropertyBridge<C> {
    /// Creates a bridge for the configured device and node.
    pub fn new(client: C, config: &Config) -> Self {
        let node_topic = format!(
            "{}/{}/{}",
            config.mqtt.topic_prefix, config.device.id, config.node.id
        );
        Self {
            client,
            node_topic,
            properties: Vec::new(),
            settable: Vec::new(),
        }
    }

    /// Topic carrying `property`'s value.
    pub fn property_topic(&self, property: &str) -> String {
        format!("{}/{}", self.node_topic, property)
    }

    /// Base topic of the node.
    pub fn node_topic(&self) -> &str {
        &self.node_topic
    }

    /// Drains received messages and routes property writes to `node`.
    ///
    /// Returns the number of writes the node handled.
    pub fn poll<N: NodeLifecycle>(&mut self, node: &mut N) -> usize {
        let mut handled = 0;
        while let Some(msg) = self.client.try_recv() {
            let Some(property) = self.settable_property(&msg.topic) else {
                debug!("ignoring message on {}", msg.topic);
                continue;
            };
            let Some(value) = msg.payload_str() else {
                warn!("non-UTF-8 write to {} dropped", property);
                continue;
            };
            if node.handle_input(&property, value, self) {
                handled += 1;
            }
        }
        handled
    }

    fn settable_property(&self, topic: &str) -> Option<String> {
        let property = topic
            .strip_prefix(self.node_topic.as_str())?
            .strip_prefix('/')?
            .strip_suffix(SET_SUFFIX)?;
        self.settable
            .iter()
            .find(|p| p.as_str() == property)
            .cloned()
    }

    fn attribute(&mut self, property: &str, name: &str, value: &str) -> Result<(), C::Error> {
        let topic = format!("{}/{}/{}", self.node_topic, property, name);
        self.client.publish(&topic, value.as_bytes(), true)
    }

    /// Whether the underlying client is connected.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// The underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Mutable access to the underlying client.
    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }
}

impl<C: MqttClient> PropertyPublisher for PropertyBridge<C> {
    type Error = C::Error;

    fn advertise(&mut self, spec: &PropertySpec<'_>) -> Result<(), C::Error> {
        self.attribute(spec.id, "$name", spec.name)?;
        self.attribute(spec.id, "$datatype", spec.datatype)?;
        if !spec.format.is_empty() {
            self.attribute(spec.id, "$format", spec.format)?;
        }
        if spec.settable {
            self.attribute(spec.id, "$settable", "true")?;
            let topic = format!("{}/{}{}", self.node_topic, spec.id, SET_SUFFIX);
            self.client.subscribe(&topic)?;
            if !self.settable.iter().any(|p| p == spec.id) {
                self.settable.push(spec.id.into());
            }
        }
        if !spec.retained {
            self.attribute(spec.id, "$retained", "false")?;
        }

        if !self.properties.iter().any(|p| p == spec.id) {
            self.properties.push(spec.id.into());
        }
        let list = self.properties.join(",");
        let topic = format!("{}/$properties", self.node_topic);
        self.client.publish(&topic, list.as_bytes(), true)
    }

    fn publish(&mut self, property: &str, value: &str, retained: bool) -> Result<(), C::Error> {
        let topic = self.property_topic(property);
        self.client.publish(&topic, value.as_bytes(), retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockMqtt;

    fn bridge() -> PropertyBridge<MockMqtt> {
        PropertyBridge::new(MockMqtt::new(), &Config::default())
    }

    fn command_spec() -> PropertySpec<'static> {
        PropertySpec {
            id: "system",
            name: "Command Handler",
            datatype: "string",
            format: "",
            settable: true,
            retained: false,
        }
    }

    #[test]
    fn topics_follow_homie_layout() {
        let bridge = bridge();
        assert_eq!(bridge.node_topic(), "homie/occupancy-1/Occupancy");
        assert_eq!(bridge.property_topic("motion"), "homie/occupancy-1/Occupancy/motion");
    }

    #[test]
    fn advertise_publishes_attributes() {
        let mut bridge = bridge();
        bridge
            .advertise(&PropertySpec {
                id: "motion",
                name: "Motion",
                datatype: "enum",
                format: "ON,OFF",
                settable: false,
                retained: true,
            })
            .unwrap();

        let mqtt = bridge.client();
        let format = mqtt.published_to("homie/occupancy-1/Occupancy/motion/$format");
        assert_eq!(format[0].1, b"ON,OFF");
        assert!(format[0].2);
        assert!(mqtt.published_to("homie/occupancy-1/Occupancy/motion/$settable").is_empty());
        assert!(mqtt.subscriptions.is_empty());
    }

    #[test]
    fn advertise_settable_subscribes() {
        let mut bridge = bridge();
        bridge.advertise(&command_spec()).unwrap();
        assert!(bridge.client().is_subscribed("homie/occupancy-1/Occupancy/system/set"));
        assert_eq!(
            bridge.client().published_to("homie/occupancy-1/Occupancy/system/$retained")[0].1,
            b"false"
        );
    }

    #[test]
    fn properties_list_grows() {
        let mut bridge = bridge();
        bridge.advertise(&command_spec()).unwrap();
        bridge
            .advertise(&PropertySpec {
                id: "occupancy",
                name: "Occupancy",
                datatype: "json",
                format: "",
                settable: false,
                retained: false,
            })
            .unwrap();
        let lists = bridge.client().published_to("homie/occupancy-1/Occupancy/$properties");
        assert_eq!(lists.last().map(|m| m.1.as_slice()), Some(&b"system,occupancy"[..]));
    }

    #[test]
    fn only_settable_properties_route() {
        let mut bridge = bridge();
        bridge.advertise(&command_spec()).unwrap();
        assert_eq!(
            bridge.settable_property("homie/occupancy-1/Occupancy/system/set").as_deref(),
            Some("system")
        );
        assert_eq!(bridge.settable_property("homie/occupancy-1/Occupancy/motion/set"), None);
        assert_eq!(bridge.settable_property("homie/occupancy-1/Occupancy/system"), None);
        assert_eq!(bridge.settable_property("other/occupancy-1/Occupancy/system/set"), None);
    }
}
