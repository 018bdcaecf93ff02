// ABOUTME: Mentor chatbot domain enumerations: FAQ categories, response types, intents
// ABOUTME: Categories carry their stable key and the human-readable display name
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Topic an FAQ entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaqCategory {
    /// Getting a startup off the ground
    StartupBasics,
    /// Raising money
    Funding,
    /// Hiring and co-founders
    TeamBuilding,
    /// Building the product
    ProductDevelopment,
    /// Reaching customers
    Marketing,
    /// Incorporation and compliance
    Legal,
    /// Everything else
    #[default]
    General,
    /// How to use this platform
    Platform,
}

impl FaqCategory {
    /// Every category in declaration order
    pub const ALL: [Self; 8] = [
        Self::StartupBasics,
        Self::Funding,
        Self::TeamBuilding,
        Self::ProductDevelopment,
        Self::Marketing,
        Self::Legal,
        Self::General,
        Self::Platform,
    ];

    /// Stable key used in storage and query strings
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StartupBasics => "startup_basics",
            Self::Funding => "funding",
            Self::TeamBuilding => "team_building",
            Self::ProductDevelopment => "product_development",
            Self::Marketing => "marketing",
            Self::Legal => "legal",
            Self::General => "general",
            Self::Platform => "platform",
        }
    }

    /// Human-readable category name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::StartupBasics => "Startup Basics",
            Self::Funding => "Funding & Investment",
            Self::TeamBuilding => "Team Building",
            Self::ProductDevelopment => "Product Development",
            Self::Marketing => "Marketing & Sales",
            Self::Legal => "Legal & Compliance",
            Self::General => "General Guidance",
            Self::Platform => "Platform Usage",
        }
    }
}

impl fmt::Display for FaqCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaqCategory {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown FAQ category: {s}")))
    }
}

/// How a chatbot reply was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Answer taken verbatim from a matched FAQ entry
    FaqMatch,
    /// Canned greeting
    Greeting,
    /// Canned reply when nothing matched
    Fallback,
    /// Canned farewell
    Goodbye,
}

impl ResponseType {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FaqMatch => "faq_match",
            Self::Greeting => "greeting",
            Self::Fallback => "fallback",
            Self::Goodbye => "goodbye",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "faq_match" => Ok(Self::FaqMatch),
            "greeting" => Ok(Self::Greeting),
            "fallback" => Ok(Self::Fallback),
            "goodbye" => Ok(Self::Goodbye),
            other => Err(AppError::invalid_input(format!("Unknown response type: {other}"))),
        }
    }
}

/// Conversational intent detected before FAQ matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Salutation or request for help
    Greeting,
    /// Farewell or thanks
    Goodbye,
    /// Neither; route to FAQ matching
    None,
}
