// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod collection;
mod track;

#[cfg(test)]
pub(crate) use collection::read_collection_metadata;
pub use collection::{CollectionRecord, write_collection_metadata};
pub use track::{
    IDENTITY_OWNER, TrackIdentity, TrackTags, compose_description, read_track_identity,
    write_track_tags,
};
