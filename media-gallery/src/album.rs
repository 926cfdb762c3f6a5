use std::collections::{HashMap, HashSet};

use crate::models::{Album, MediaFile};

/// Groups adapter-ordered media files into albums.
///
/// Albums appear in first-encounter order. Within an album the adapter order
/// is replaced by an explicit sort on date added, because merged image and
/// video queries do not arrive uniformly ordered. The sort is stable: files
/// with equal timestamps keep their adapter-relative order.
pub fn aggregate_albums(files: Vec<MediaFile>) -> Vec<Album> {
    let mut albums: Vec<Album> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for file in files {
        if !seen.insert((file.album_id.clone(), file.id.clone())) {
            log::debug!("dropping duplicate file {} in album {}", file.id, file.album_id);
            continue;
        }

        match index_by_id.get(&file.album_id) {
            Some(&index) => albums[index].files.push(file),
            None => {
                index_by_id.insert(file.album_id.clone(), albums.len());
                albums.push(Album {
                    id: file.album_id.clone(),
                    name: file.album_name.clone(),
                    files: vec![file],
                });
            }
        }
    }

    for album in &mut albums {
        album
            .files
            .sort_by(|a, b| b.date_added.cmp(&a.date_added));
    }

    albums
}
