use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Location data attached to a signup from an IP lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

/// Stored early access signup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Signup {
    pub id: i32,
    pub name: String,
    /// Natural key, unique across the table
    pub email: String,
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Values submitted for an upsert
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSignup {
    pub name: String,
    pub email: String,
    pub ip: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub timezone: Option<String>,
}

impl NewSignup {
    /// Build the upsert values from the form fields and an optional lookup result.
    ///
    /// The stored IP is the one the lookup reported, falling back to the
    /// resolved client IP.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        client_ip: Option<String>,
        geo: Option<GeoLocation>,
    ) -> Self {
        let geo = geo.unwrap_or_default();
        Self {
            name: name.into(),
            email: email.into(),
            ip: geo.ip.or(client_ip),
            city: geo.city,
            region: geo.region,
            country: geo.country,
            country_code: geo.country_code,
            latitude: geo.latitude,
            longitude: geo.longitude,
            timezone: geo.timezone,
        }
    }
}

fn fill_forward<T: Clone>(current: &mut Option<T>, incoming: &Option<T>) {
    if let Some(value) = incoming {
        *current = Some(value.clone());
    }
}

impl Signup {
    /// Create a fresh row from submitted values
    pub fn from_new(id: i32, new: &NewSignup, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            ip: new.ip.clone(),
            city: new.city.clone(),
            region: new.region.clone(),
            country: new.country.clone(),
            country_code: new.country_code.clone(),
            latitude: new.latitude,
            longitude: new.longitude,
            timezone: new.timezone.clone(),
            created_at,
        }
    }

    /// Apply a re-submission for the same email.
    ///
    /// The name is always overwritten. Location fields only change when the
    /// new submission carries a value; a missing value never erases stored data.
    pub fn merge(&mut self, new: &NewSignup) {
        self.name = new.name.clone();
        fill_forward(&mut self.ip, &new.ip);
        fill_forward(&mut self.city, &new.city);
        fill_forward(&mut self.region, &new.region);
        fill_forward(&mut self.country, &new.country);
        fill_forward(&mut self.country_code, &new.country_code);
        fill_forward(&mut self.latitude, &new.latitude);
        fill_forward(&mut self.longitude, &new.longitude);
        fill_forward(&mut self.timezone, &new.timezone);
    }

    /// "City, Region, Country" with missing parts left out
    pub fn location(&self) -> String {
        [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Case-insensitive search over name, email, location and IP
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        self.name.to_lowercase().contains(&term)
            || self.email.to_lowercase().contains(&term)
            || self.location().to_lowercase().contains(&term)
            || self
                .ip
                .as_deref()
                .is_some_and(|ip| ip.to_lowercase().contains(&term))
    }
}
