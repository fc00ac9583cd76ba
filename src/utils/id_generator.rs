// src/utils/id_generator.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    Driver,
    Customer,
    Booking,
    RideRequest,
    Offer,
    Vehicle,
    Payment,
}

impl IdType {
    pub fn to_prefix(&self) -> &'static str {
        match self {
            IdType::Driver => "drv",
            IdType::Customer => "cus",
            IdType::Booking => "bok",
            IdType::RideRequest => "req",
            IdType::Offer => "ofr",
            IdType::Vehicle => "veh",
            IdType::Payment => "pay",
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefix())
    }
}

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a unique ID with format: {prefix}-{YYMMDD}-{6 random chars}
    pub fn generate(id_type: IdType) -> String {
        Self::generate_with_timestamp(id_type, Utc::now())
    }

    /// Generate ID with a specific timestamp (useful for testing)
    pub fn generate_with_timestamp(id_type: IdType, timestamp: DateTime<Utc>) -> String {
        let date_part = timestamp.format("%y%m%d").to_string();
        let random_suffix = Self::generate_random_suffix();

        format!("{}-{}-{}", id_type.to_prefix(), date_part, random_suffix)
    }

    fn generate_random_suffix() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::rng();
        (0..6)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }

    /// Parse an ID to extract its components
    pub fn parse_id(id: &str) -> Option<ParsedId> {
        let parts: Vec<&str> = id.split('-').collect();
        if parts.len() != 3 {
            return None;
        }

        let prefix = parts[0];
        let date_part = parts[1];
        let random_suffix = parts[2];

        if date_part.len() != 6 || random_suffix.len() != 6 {
            return None;
        }

        let id_type = match prefix {
            "drv" => IdType::Driver,
            "cus" => IdType::Customer,
            "bok" => IdType::Booking,
            "req" => IdType::RideRequest,
            "ofr" => IdType::Offer,
            "veh" => IdType::Vehicle,
            "pay" => IdType::Payment,
            _ => return None,
        };

        // YYMMDD, years since 2000
        let year = format!("20{}", &date_part[0..2]).parse::<i32>().ok()?;
        let month = date_part[2..4].parse::<u32>().ok()?;
        let day = date_part[4..6].parse::<u32>().ok()?;

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }

        Some(ParsedId {
            id_type,
            year,
            month,
            day,
            random_suffix: random_suffix.to_string(),
        })
    }

    /// Validate if an ID matches the expected format and type
    pub fn validate_id(id: &str, expected_type: Option<IdType>) -> bool {
        match Self::parse_id(id) {
            Some(parsed) => match expected_type {
                Some(expected) => parsed.id_type == expected,
                None => true,
            },
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedId {
    pub id_type: IdType,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub random_suffix: String,
}

impl ParsedId {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(self.year, self.month, self.day, 0, 0, 0)
            .single()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("Invalid ID format")]
    InvalidFormat,

    #[error("Unknown ID type: {0}")]
    UnknownType(String),
}

/// Assign a freshly generated id to a model in place.
pub trait WithGeneratedId {
    fn set_generated_id(&mut self, id_type: IdType);

    fn with_generated_id(mut self, id_type: IdType) -> Self
    where
        Self: Sized,
    {
        self.set_generated_id(id_type);
        self
    }
}

impl WithGeneratedId for crate::models::driver::Driver {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

impl WithGeneratedId for crate::models::booking::Booking {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}
