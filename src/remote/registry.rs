use crate::clubos_api::clubos_client::RemoteApiTrait;
use crate::clubos_api::models::device_record::DeviceRecord;
use crate::error::ApiError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// What a location has installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationConfig {
    pub name: String,
    pub bays: Vec<u32>,
    #[serde(rename = "hasMusic")]
    pub has_music: bool,
    #[serde(rename = "hasTv")]
    pub has_tv: bool,
}

impl LocationConfig {
    fn new(name: &str, bay_count: u32, has_music: bool, has_tv: bool) -> Self {
        Self {
            name: name.to_string(),
            bays: (1..=bay_count).collect(),
            has_music,
            has_tv,
        }
    }
}

/// Locations used when the device list comes back empty.
pub fn default_locations() -> Vec<LocationConfig> {
    vec![
        LocationConfig::new("Bedford", 2, true, false),
        LocationConfig::new("Dartmouth", 4, true, true),
        LocationConfig::new("Stratford", 3, true, false),
        LocationConfig::new("Bayers Lake", 5, true, true),
    ]
}

/// Groups devices into one config per location, ordered by name.
///
/// Any device carrying a parseable bay number contributes that bay; bays are
/// deduplicated and ascending. An empty device list yields
/// [`default_locations`].
pub fn derive_locations(devices: &[DeviceRecord]) -> Vec<LocationConfig> {
    if devices.is_empty() {
        return default_locations();
    }
    group_devices(devices)
}

fn group_devices(devices: &[DeviceRecord]) -> Vec<LocationConfig> {
    #[derive(Default)]
    struct Acc {
        bays: BTreeSet<u32>,
        has_music: bool,
        has_tv: bool,
    }

    let mut by_location: BTreeMap<&str, Acc> = BTreeMap::new();
    for device in devices {
        let location = device.location.trim();
        if location.is_empty() {
            debug!("Skipping device without location: {:?}", device.name);
            continue;
        }
        let acc = by_location.entry(location).or_default();
        if let Some(bay) = device.bay() {
            acc.bays.insert(bay);
        }
        match device.device_type.to_ascii_lowercase().as_str() {
            "music" => acc.has_music = true,
            "tv" => acc.has_tv = true,
            _ => {}
        }
    }

    by_location
        .into_iter()
        .map(|(name, acc)| LocationConfig {
            name: name.to_string(),
            bays: acc.bays.into_iter().collect(),
            has_music: acc.has_music,
            has_tv: acc.has_tv,
        })
        .collect()
}

/// Location configs derived from the live device list.
#[derive(Debug, Clone, Default)]
pub struct LocationRegistry {
    locations: Vec<LocationConfig>,
    from_fallback: bool,
}

impl LocationRegistry {
    pub fn from_devices(devices: &[DeviceRecord], use_fallback: bool) -> Self {
        if devices.is_empty() {
            if use_fallback {
                warn!("Device list is empty, using built-in locations");
                return Self {
                    locations: default_locations(),
                    from_fallback: true,
                };
            }
            warn!("Device list is empty, no locations available");
            return Self::default();
        }
        Self {
            locations: derive_locations(devices),
            from_fallback: false,
        }
    }

    /// Fetches the device list and derives the registry from it. A failed fetch
    /// is treated like an empty list.
    pub async fn load<T: RemoteApiTrait>(api: &T, use_fallback: bool) -> Self {
        let devices = match api.get_devices().await {
            Ok(devices) => devices,
            Err(e) if ApiError::is_unauthorized(&e) => {
                debug!("Skipping device list: not authenticated");
                Vec::new()
            }
            Err(e) => {
                warn!("Error occurred while getting devices: {:?}", e);
                Vec::new()
            }
        };
        Self::from_devices(&devices, use_fallback)
    }

    pub fn locations(&self) -> &[LocationConfig] {
        &self.locations
    }

    pub fn location_names(&self) -> Vec<String> {
        self.locations.iter().map(|l| l.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&LocationConfig> {
        self.locations
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(name))
    }

    pub fn is_fallback(&self) -> bool {
        self.from_fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::test_support::FakeApi;

    fn device(location: &str, device_type: &str, bay: Option<&str>) -> DeviceRecord {
        DeviceRecord {
            location: location.to_string(),
            device_type: device_type.to_string(),
            bay_number: bay.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn empty_list_gives_default_locations() {
        let locations = derive_locations(&[]);
        assert_eq!(locations, default_locations());
        assert_eq!(
            locations.iter().map(|l| l.name.as_str()).collect::<Vec<_>>(),
            vec!["Bedford", "Dartmouth", "Stratford", "Bayers Lake"]
        );
    }

    #[test]
    fn bedford_example() {
        let devices = vec![
            device("Bedford", "trackman", Some("2")),
            device("Bedford", "trackman", Some("1")),
            device("Bedford", "music", None),
        ];

        assert_eq!(
            derive_locations(&devices),
            vec![LocationConfig {
                name: "Bedford".to_string(),
                bays: vec![1, 2],
                has_music: true,
                has_tv: false,
            }]
        );
    }

    #[test]
    fn duplicate_bays_are_deduplicated_and_sorted() {
        let devices = vec![
            device("Dartmouth", "trackman", Some("3")),
            device("Dartmouth", "trackman", Some("1")),
            device("Dartmouth", "pc", Some("3")),
            device("Dartmouth", "trackman", Some("2")),
            device("Dartmouth", "trackman", Some("1")),
            device("Dartmouth", "TV", None),
        ];

        let locations = derive_locations(&devices);
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].bays, vec![1, 2, 3]);
        assert!(locations[0].has_tv);
        assert!(!locations[0].has_music);
    }

    #[test]
    fn locations_are_ordered_by_name() {
        let devices = vec![
            device("Stratford", "trackman", Some("1")),
            device("Bedford", "trackman", Some("1")),
            device("  ", "trackman", Some("9")),
        ];
        let names: Vec<String> = derive_locations(&devices)
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Bedford", "Stratford"]);
    }

    #[test]
    fn registry_without_fallback_stays_empty() {
        let registry = LocationRegistry::from_devices(&[], false);
        assert!(registry.locations().is_empty());
        assert!(!registry.is_fallback());

        let registry = LocationRegistry::from_devices(&[], true);
        assert!(registry.is_fallback());
        assert_eq!(registry.get("bayers lake").unwrap().bays, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn failed_fetch_falls_back() {
        let api = FakeApi::default();
        api.fail_devices(true);

        let registry = LocationRegistry::load(&api, true).await;
        assert!(registry.is_fallback());
        assert_eq!(registry.location_names().len(), 4);
    }

    #[tokio::test]
    async fn device_without_location_does_not_trigger_fallback() {
        let devices: Vec<DeviceRecord> = serde_json::from_str(
            r#"[
                {"location": "Bedford", "device_type": "trackman", "bay_number": "1"},
                {"device_type": "pc", "name": "office"}
            ]"#,
        )
        .unwrap();
        let api = FakeApi::with_devices(devices);

        let registry = LocationRegistry::load(&api, true).await;
        assert!(!registry.is_fallback());
        assert_eq!(
            registry.locations(),
            &[LocationConfig {
                name: "Bedford".to_string(),
                bays: vec![1],
                has_music: false,
                has_tv: false,
            }]
        );
    }

    #[tokio::test]
    async fn unauthorized_fetch_falls_back() {
        let api = FakeApi::default();
        api.unauthorized(true);

        let registry = LocationRegistry::load(&api, true).await;
        assert!(registry.is_fallback());
        assert_eq!(api.call_count("get_devices"), 1);
    }

    #[tokio::test]
    async fn load_derives_from_device_list() {
        let api = FakeApi::with_devices(vec![device("Truro", "trackman", Some("1"))]);

        let registry = LocationRegistry::load(&api, true).await;
        assert!(!registry.is_fallback());
        assert_eq!(registry.location_names(), vec!["Truro"]);
    }
}
