//! Share links
//!
//! A beat is shared as a page URL whose query carries the pair:
//! `https://binaura.app/?l=200&r=196`. Reading a link seeds the
//! configuration; the link is rewritten whenever the frequencies change.

use crate::config::share::{LEFT_PARAM, RIGHT_PARAM};
use crate::error::{AppError, Result};
use binaura::audio::types::{validate_frequency, BeatDescriptor};
use reqwest::Url;

/// Frequency pair carried by a share link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShareLink {
    pub left_hz: f64,
    pub right_hz: f64,
}

impl ShareLink {
    pub fn new(left_hz: f64, right_hz: f64) -> Self {
        Self { left_hz, right_hz }
    }

    pub fn beat(&self) -> BeatDescriptor {
        BeatDescriptor::new(self.left_hz, self.right_hz)
    }

    /// Render the link against `base`, replacing any existing query
    pub fn to_url(&self, base: &str) -> Result<String> {
        let mut url = Url::parse(base)
            .map_err(|e| AppError::InvalidLink(format!("bad base URL {:?}: {}", base, e)))?;
        url.query_pairs_mut()
            .clear()
            .append_pair(LEFT_PARAM, &self.left_hz.to_string())
            .append_pair(RIGHT_PARAM, &self.right_hz.to_string());
        Ok(url.into())
    }

    /// Read a pair from a full URL or a bare query such as `?l=200&r=196`
    pub fn parse(link: &str) -> Result<Self> {
        let link = link.trim();
        let url = match Url::parse(link) {
            Ok(url) => url,
            Err(_) => {
                let query = link.trim_start_matches('?');
                Url::parse(&format!("binaura:?{}", query))
                    .map_err(|e| AppError::InvalidLink(format!("{:?}: {}", link, e)))?
            }
        };

        let mut left = None;
        let mut right = None;
        for (key, value) in url.query_pairs() {
            if key == LEFT_PARAM {
                left = Some(parse_hz(&key, &value)?);
            } else if key == RIGHT_PARAM {
                right = Some(parse_hz(&key, &value)?);
            }
        }

        match (left, right) {
            (Some(left_hz), Some(right_hz)) => Ok(Self::new(left_hz, right_hz)),
            _ => Err(AppError::InvalidLink(format!(
                "{:?} needs both '{}' and '{}'",
                link, LEFT_PARAM, RIGHT_PARAM
            ))),
        }
    }
}

fn parse_hz(key: &str, value: &str) -> Result<f64> {
    let hz: f64 = value
        .parse()
        .map_err(|_| AppError::InvalidLink(format!("'{}' is not a number: {:?}", key, value)))?;
    validate_frequency(hz).map_err(|e| AppError::InvalidLink(e.to_string()))
}
