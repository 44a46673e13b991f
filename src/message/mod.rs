// Copyright 2023 The querent developers.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Composition of DNS queries and decoding of DNS responses.

pub mod constants;
mod flags;
pub mod query;
pub mod response;
pub use flags::Flags;
pub use query::{Framing, QueryKind};
pub use response::{Record, Response};
