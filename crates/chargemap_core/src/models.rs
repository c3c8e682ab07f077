use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Operational status of a charging station or connector.
///
/// This is a closed set: every raw status string the backend (or the push
/// channel) sends is normalized into one of these variants at the ingestion
/// boundary and never trusted downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StationStatus {
    Available,
    Busy,
    OutOfOrder,
    #[default]
    Unknown,
}

impl StationStatus {
    /// Normalize a raw status string.
    ///
    /// Matching is case-insensitive and ignores separators, so `busy`,
    /// `OUT_OF_ORDER` and `out-of-order` all resolve. `OCCUPIED` is the
    /// connector-level spelling of [`StationStatus::Busy`]. Anything
    /// unrecognized maps to [`StationStatus::Unknown`] rather than failing.
    pub fn from_raw(raw: &str) -> Self {
        let canonical: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match canonical.as_str() {
            "AVAILABLE" => StationStatus::Available,
            "BUSY" | "OCCUPIED" => StationStatus::Busy,
            "OUTOFORDER" => StationStatus::OutOfOrder,
            _ => StationStatus::Unknown,
        }
    }

    /// The canonical wire spelling used by the backend.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            StationStatus::Available => "AVAILABLE",
            StationStatus::Busy => "BUSY",
            StationStatus::OutOfOrder => "OUT_OF_ORDER",
            StationStatus::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

impl Serialize for StationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire_str())
    }
}

impl<'de> Deserialize<'de> for StationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // A missing or null status degrades to Unknown instead of failing
        // the whole document.
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| StationStatus::from_raw(&s)).unwrap_or_default())
    }
}

/// GeoJSON point as stored by the backend: coordinates are
/// `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type", default = "Location::default_kind")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

impl Location {
    fn default_kind() -> String {
        "Point".to_string()
    }

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Location {
            kind: Self::default_kind(),
            coordinates: [longitude, latitude],
        }
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A single plug on a station. Passed through to presentation unmodified;
/// only the status participates in normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    /// Connector standard: CCS, CHAdeMO, Type2, Type1, Tesla.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub power_kw: Option<f64>,
    #[serde(default)]
    pub status: StationStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A charging station as returned by the nearby search.
///
/// `id` is the backend's `tomtom_id` and is unique within a session's list.
/// Everything except `status` is opaque to the view-model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(alias = "tomtom_id")]
    pub id: String,
    pub name: String,
    pub location: Location,
    #[serde(default)]
    pub status: StationStatus,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub connectors: Vec<Connector>,
    #[serde(default)]
    pub operator: Option<Operator>,
}

/// A status-only update for one station, delivered over the push channel.
///
/// A patch only ever applies to a station already present in the list; it
/// never synthesizes one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPatch {
    #[serde(alias = "tomtom_id")]
    pub station_id: String,
    #[serde(default)]
    pub status: StationStatus,
}

/// Counts over the current station list, one bucket per status category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub available: usize,
    pub busy: usize,
    pub out_of_order: usize,
    pub unknown: usize,
}

/// The (center, radius) pair defining the current query scope.
///
/// Validated on construction; equality is what decides whether an in-flight
/// fetch is still relevant, so changing the center, radius or filter yields
/// a context that compares unequal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchContext {
    latitude: f64,
    longitude: f64,
    radius_meters: u32,
    #[serde(default)]
    status_filter: Option<StationStatus>,
}

impl SearchContext {
    pub fn new(
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<Self, SearchContextError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SearchContextError::LatitudeOutOfRange { latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(SearchContextError::LongitudeOutOfRange { longitude });
        }
        if radius_meters == 0 {
            return Err(SearchContextError::ZeroRadius);
        }
        Ok(SearchContext {
            latitude,
            longitude,
            radius_meters,
            status_filter: None,
        })
    }

    /// Restrict the search to stations currently in the given status.
    pub fn with_status_filter(mut self, status: StationStatus) -> Self {
        self.status_filter = Some(status);
        self
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn radius_meters(&self) -> u32 {
        self.radius_meters
    }

    pub fn status_filter(&self) -> Option<StationStatus> {
        self.status_filter
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum SearchContextError {
    #[error("latitude {latitude} is outside [-90, 90]")]
    LatitudeOutOfRange { latitude: f64 },
    #[error("longitude {longitude} is outside [-180, 180]")]
    LongitudeOutOfRange { longitude: f64 },
    #[error("search radius must be greater than zero")]
    ZeroRadius,
}
