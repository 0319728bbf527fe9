// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

pub mod cli;
pub mod evaluate;
pub mod util;
