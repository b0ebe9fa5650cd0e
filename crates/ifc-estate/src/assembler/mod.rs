// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assembly of domain entities from native records

pub mod building;
pub mod element;

pub use building::{extent, BuildingAssembler, DEFAULT_BUILDING_NAME, MAIN_BUILDING_ID, MAIN_BUILDING_NAME};
pub use element::{ElementAssembler, UNKNOWN_MATERIAL, UNNAMED_LEVEL};
