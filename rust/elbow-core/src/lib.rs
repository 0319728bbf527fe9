// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

pub mod error;
pub mod utils;

pub use error::{Error, Result};
