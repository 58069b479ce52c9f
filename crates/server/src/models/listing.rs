use serde::Deserialize;

use crate::error::{RequestError, ValidationError};
use crate::server::constants::MAX_LISTING_ELEMENTS;
pub const DEFAULT_LIMIT: i64 = 100;
pub const DEFAULT_PAGE: i64 = 1;

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub page: i64,
}

pub fn validate_limit(limit: i64) -> Result<(), RequestError> {
    if limit < 1 {
        return Err(ValidationError::InvalidInput {
            value: limit.to_string(),
            reason: "limit should be >= 1".to_string(),
        }
        .into());
    }
    if limit > MAX_LISTING_ELEMENTS {
        return Err(ValidationError::LimitExceeded {
            subject: "listing limit".to_string(),
            unit: "element".to_string(),
            attempted: limit as usize,
            limit: MAX_LISTING_ELEMENTS as usize,
        }
        .into());
    }
    Ok(())
}

pub fn validate_page(page: i64) -> Result<(), RequestError> {
    if page < 1 {
        return Err(ValidationError::InvalidInput {
            value: page.to_string(),
            reason: "page should be >= 1".to_string(),
        }
        .into());
    }
    Ok(())
}

impl Page {
    pub fn from_query(query: ListingQuery) -> Result<Self, RequestError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        validate_limit(limit)?;
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        validate_page(page)?;
        Ok(Self { limit, page })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}
