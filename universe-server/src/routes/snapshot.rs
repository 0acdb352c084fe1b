//! `GET /snapshot` (spec §6.1).

use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;

use universe_core::encoder::{encode_snapshot, Compression, Format};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_compression")]
    pub compression: String,
    pub limit: Option<usize>,
}

fn default_format() -> String {
    "vertex28".to_string()
}

fn default_compression() -> String {
    "zstd".to_string()
}

/// A query param that doesn't name one of the two known literals is a
/// malformed request (400), distinct from the "declared capability
/// genuinely unavailable at runtime" case the encoder itself guards with
/// `CapabilityMissing` → 503 (§9 Design Notes, explicit capability
/// enumeration).
pub async fn get_snapshot(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> ApiResult<impl IntoResponse> {
    let format = Format::parse(&query.format)
        .map_err(|_| ApiError::BadRequest(format!("unsupported format '{}'", query.format)))?;
    let compression = Compression::parse(&query.compression)
        .map_err(|_| ApiError::BadRequest(format!("unsupported compression '{}'", query.compression)))?;

    let limit = query.limit.unwrap_or(state.engine.store.len().max(1));
    let snapshot = state.engine.build_snapshot(limit).await.map_err(ApiError::from)?;
    let debug = state.config.engine.debug;

    let encoded = encode_snapshot(&snapshot, format, compression, debug).map_err(ApiError::from)?;

    let Some(encoded) = encoded else {
        let mut headers = HeaderMap::new();
        headers.insert("x-asset-count", HeaderValue::from_static("0"));
        return Ok((StatusCode::NO_CONTENT, headers, Vec::<u8>::new()));
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        "x-vertex-stride",
        HeaderValue::from_str(&encoded.headers.vertex_stride.to_string()).unwrap(),
    );
    headers.insert(
        "x-asset-count",
        HeaderValue::from_str(&encoded.headers.asset_count.to_string()).unwrap(),
    );
    headers.insert("x-source-tier", HeaderValue::from_static(encoded.headers.source_tier));
    headers.insert("cache-control", HeaderValue::from_static(encoded.headers.cache_control));
    if let Some(encoding) = encoded.headers.content_encoding {
        headers.insert("content-encoding", HeaderValue::from_static(encoding));
    }

    Ok((StatusCode::OK, headers, encoded.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_spec_s_implicit_defaults() {
        assert_eq!(default_format(), "vertex28");
        assert_eq!(default_compression(), "zstd");
    }

    #[test]
    fn known_literals_parse_to_the_expected_capability() {
        assert!(matches!(Format::parse(&default_format()), Ok(Format::Vertex28)));
        assert!(matches!(Compression::parse(&default_compression()), Ok(Compression::Zstd)));
        assert!(matches!(Compression::parse("none"), Ok(Compression::None)));
    }

    #[test]
    fn unknown_format_is_rejected_at_the_capability_layer() {
        assert!(Format::parse("flatbuffer").is_err());
    }
}
