//! Configuration validation
//!
//! This module provides validation logic for all configuration structures.

use super::Config;
use super::models::{BackendConfig, CategoryRange, CredentialConfig, PipelineConfig};
use crate::utils::error::{PipelineError, Result};
use url::Url;

/// Trait for validating configuration structures
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for Config {
    fn validate(&self) -> Result<()> {
        if self.credentials.is_empty() {
            return Err(PipelineError::NoCredentials);
        }
        for credential in &self.credentials {
            credential.validate()?;
        }
        self.pipeline.validate()?;
        self.backend.validate()?;

        if self.taxonomy.is_empty() {
            return Err(PipelineError::config(
                "taxonomy must declare at least one category range",
            ));
        }
        for range in &self.taxonomy {
            range.validate()?;
        }
        Ok(())
    }
}

impl Validate for CredentialConfig {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::config("credential name must not be empty"));
        }
        if self.secret.trim().is_empty() {
            return Err(PipelineError::config(format!(
                "credential '{}': secret must not be empty",
                self.name
            )));
        }
        if self.model_id.trim().is_empty() {
            return Err(PipelineError::config(format!(
                "credential '{}': model_id must not be empty",
                self.name
            )));
        }
        if self.requests_per_minute == 0 {
            return Err(PipelineError::config(format!(
                "credential '{}': requests_per_minute must be at least 1",
                self.name
            )));
        }
        validate_endpoint(&self.name, &self.endpoint)
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.workers.min == 0 {
            return Err(PipelineError::config("workers.min must be at least 1"));
        }
        if self.workers.min > self.workers.max {
            return Err(PipelineError::config(format!(
                "workers.min ({}) must not exceed workers.max ({})",
                self.workers.min, self.workers.max
            )));
        }
        validate_fraction("workers.free_utilization", self.workers.free_utilization)?;
        validate_fraction("workers.paid_utilization", self.workers.paid_utilization)?;
        validate_fraction("breaker_failure_fraction", self.breaker_failure_fraction)?;

        if self.worker_timeout_secs == 0 {
            return Err(PipelineError::config(
                "worker_timeout_secs must be at least 1",
            ));
        }
        if self.rate_window_secs == 0 {
            return Err(PipelineError::config("rate_window_secs must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(PipelineError::config(
                "retry.max_attempts must be at least 1",
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(PipelineError::config(
                "retry.backoff_multiplier must be at least 1.0",
            ));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(PipelineError::config(
                "retry.jitter must be between 0.0 and 1.0",
            ));
        }
        Ok(())
    }
}

impl Validate for BackendConfig {
    fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(PipelineError::config(
                "backend.request_timeout_secs must be at least 1",
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(PipelineError::config(
                "backend.connect_timeout_secs must be at least 1",
            ));
        }
        Ok(())
    }
}

impl Validate for CategoryRange {
    fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(PipelineError::config(
                "taxonomy range label must not be empty",
            ));
        }
        if self.start == 0 {
            return Err(PipelineError::config(format!(
                "taxonomy range '{}': ordinals are 1-based, start must be at least 1",
                self.label
            )));
        }
        if self.start > self.end {
            return Err(PipelineError::config(format!(
                "taxonomy range '{}': start ({}) must not exceed end ({})",
                self.label, self.start, self.end
            )));
        }
        if let Some(parent) = &self.parent_label {
            if parent.trim().is_empty() {
                return Err(PipelineError::config(format!(
                    "taxonomy range '{}': parent_label must not be empty when given",
                    self.label
                )));
            }
        }
        Ok(())
    }
}

fn validate_endpoint(name: &str, endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint).map_err(|e| {
        PipelineError::config(format!(
            "credential '{}': endpoint has invalid URL format: {}",
            name, e
        ))
    })?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(PipelineError::config(format!(
                "credential '{}': endpoint must use http:// or https://, got: {}",
                name, scheme
            )));
        }
    }

    if url.host_str().is_none() {
        return Err(PipelineError::config(format!(
            "credential '{}': endpoint URL must have a host",
            name
        )));
    }
    Ok(())
}

fn validate_fraction(field: &str, value: f64) -> Result<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(PipelineError::config(format!(
            "{} must be within (0.0, 1.0], got {}",
            field, value
        )));
    }
    Ok(())
}
