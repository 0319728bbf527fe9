// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

//! Shared fixtures for Elbow tests and benchmarks.

pub mod datagen;
