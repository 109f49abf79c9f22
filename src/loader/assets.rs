use super::fetch::{fetch_bytes, Location};
use crate::error::MapError;
use macroquad::prelude::*;

/// Load one texture from a path or URL with nearest filtering.
pub async fn load_texture_from(loc: &Location) -> Result<Texture2D, MapError> {
    let tex = match loc {
        Location::Path(p) => {
            let path = p.to_str().ok_or_else(|| MapError::Texture {
                image: loc.to_string(),
                reason: "path is not valid UTF-8".into(),
            })?;
            load_texture(path).await.map_err(|e| MapError::Texture {
                image: loc.to_string(),
                reason: e.to_string(),
            })?
        }
        Location::Url(_) => {
            let bytes = fetch_bytes(loc)?;
            let image = Image::from_file_with_format(&bytes, None).map_err(|e| MapError::Texture {
                image: loc.to_string(),
                reason: e.to_string(),
            })?;
            Texture2D::from_image(&image)
        }
    };
    tex.set_filter(FilterMode::Nearest);
    Ok(tex)
}

/// Name variants tried, in order, when resolving a sprite by name:
/// as given, lowercase, then capitalised; `.png` is appended when the name
/// has no extension. Duplicates are dropped.
pub fn sprite_candidates(name: &str) -> Vec<String> {
    let with_ext = |s: String| {
        if s.rsplit('/').next().is_some_and(|f| f.contains('.')) {
            s
        } else {
            format!("{s}.png")
        }
    };

    let lower = name.to_lowercase();
    let mut chars = lower.chars();
    let capitalised = match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };

    let mut out: Vec<String> = Vec::with_capacity(3);
    for variant in [name.to_owned(), lower, capitalised] {
        if variant.is_empty() {
            continue;
        }
        let v = with_ext(variant);
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// Try candidates in order and keep the first success; later candidates
/// are never attempted once one succeeds.
pub async fn first_success<T, F, Fut>(candidates: &[String], mut load: F) -> Option<(String, T)>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = Result<T, MapError>>,
{
    for candidate in candidates {
        match load(candidate.clone()).await {
            Ok(value) => return Some((candidate.clone(), value)),
            Err(e) => log::debug!("Sprite candidate {candidate} failed: {e}"),
        }
    }
    None
}

/// Resolve a sprite by name under `base`, trying every name variant.
pub async fn load_first_texture(base: &Location, name: &str) -> Option<Texture2D> {
    let candidates = sprite_candidates(name);
    let found = first_success(&candidates, |c| {
        let loc = base.join(&c);
        async move { load_texture_from(&loc).await }
    })
    .await;
    match found {
        Some((which, tex)) => {
            log::debug!("Sprite '{name}' resolved to {which}");
            Some(tex)
        }
        None => {
            log::warn!("No sprite found for '{name}' (tried {candidates:?})");
            None
        }
    }
}
