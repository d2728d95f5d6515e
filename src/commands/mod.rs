// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod members;
pub mod trips;
pub mod expenses;
pub mod settle;
pub mod reports;
pub mod exporter;
pub mod fx;
pub mod doctor;
