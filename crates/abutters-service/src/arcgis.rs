//! ArcGIS FeatureServer layer adapter.
//!
//! Every query goes to the layer's `/query` endpoint with GeoJSON output in
//! WGS84, so the response can be decoded with [`FeatureDecoder`]. Point and
//! attribute queries are sent as GET; intersection queries carry a full
//! polygon and are POSTed as a form body.

use abutters_core::error::{AbuttersError, Result};
use abutters_core::models::{AttributeValue, Geometry, LngLat, Parcel, QueryKind};
use async_trait::async_trait;
use geojson::FeatureCollection;
use reqwest::header::CONTENT_TYPE;
use reqwest::{RequestBuilder, Url};
use serde_json::{json, Value};

use crate::decode::FeatureDecoder;
use crate::ports::{FieldEquals, SpatialQueryClient};

const WGS84_WKID: &str = "4326";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Parcel layer served by an ArcGIS REST FeatureServer
pub struct ArcGisFeatureService {
    /// Layer URL, e.g. ".../FeatureServer/0"
    layer_url: String,

    decoder: FeatureDecoder,

    /// HTTP client
    client: reqwest::Client,
}

impl ArcGisFeatureService {
    /// Create a client for the layer at `layer_url`, keyed by `pid_field`
    pub fn new(layer_url: impl Into<String>, pid_field: impl Into<String>) -> Self {
        Self::with_client(layer_url, pid_field, reqwest::Client::new())
    }

    /// Create a client reusing an existing HTTP client
    pub fn with_client(
        layer_url: impl Into<String>,
        pid_field: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        let layer_url = layer_url.into().trim_end_matches('/').to_string();
        Self { layer_url, decoder: FeatureDecoder::new(pid_field), client }
    }

    pub fn layer_url(&self) -> &str {
        &self.layer_url
    }

    pub fn pid_field(&self) -> &str {
        self.decoder.pid_field()
    }

    /// Build the full query URL for a set of query-specific parameters
    fn query_url(&self, kind: QueryKind, params: &[(&str, String)]) -> Result<Url> {
        let common = [
            ("outFields", "*".to_string()),
            ("returnGeometry", "true".to_string()),
            ("inSR", WGS84_WKID.to_string()),
            ("outSR", WGS84_WKID.to_string()),
            ("f", "geojson".to_string()),
        ];
        Url::parse_with_params(
            &format!("{}/query", self.layer_url),
            params.iter().chain(common.iter()).map(|(k, v)| (*k, v.as_str())),
        )
        .map_err(|e| AbuttersError::query_failed(kind, format!("Invalid layer URL: {}", e)))
    }

    /// Intersection query for a buffer polygon, ordered by the PID field
    fn intersects_url(&self, geometry: &Geometry) -> Result<Url> {
        self.query_url(
            QueryKind::Intersects,
            &[
                ("geometry", esri_polygon(geometry)?.to_string()),
                ("geometryType", "esriGeometryPolygon".to_string()),
                ("spatialRel", "esriSpatialRelIntersects".to_string()),
                ("orderByFields", self.pid_field().to_string()),
            ],
        )
    }

    async fn fetch(&self, kind: QueryKind, url: Url) -> Result<Vec<Parcel>> {
        tracing::debug!(query = %kind, url = %url, "Querying feature service");
        self.send(kind, self.client.get(url)).await
    }

    async fn fetch_form(&self, kind: QueryKind, url: Url) -> Result<Vec<Parcel>> {
        let (endpoint, body) = form_request(url);
        tracing::debug!(
            query = %kind,
            url = %endpoint,
            bytes = body.len(),
            "Posting to feature service"
        );
        let request = self.client.post(endpoint).header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        self.send(kind, request).await
    }

    async fn send(&self, kind: QueryKind, request: RequestBuilder) -> Result<Vec<Parcel>> {
        let response = request.send().await.map_err(|e| {
            AbuttersError::query_failed(kind, format!("Failed to reach feature service: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AbuttersError::query_failed(kind, format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            return Err(AbuttersError::query_failed(
                kind,
                format!("Feature service error ({}): {}", status, body),
            ));
        }

        let parcels = parse_response(kind, &body, &self.decoder)?;
        tracing::debug!(query = %kind, parcels = parcels.len(), "Feature service responded");
        Ok(parcels)
    }
}

/// Split an encoded query URL into its endpoint and form body
fn form_request(mut url: Url) -> (Url, String) {
    let body = url.query().unwrap_or_default().to_string();
    url.set_query(None);
    (url, body)
}

/// Decode a `/query` response body, surfacing ArcGIS error envelopes.
///
/// The service reports request errors with HTTP 200 and an `error` object.
fn parse_response(kind: QueryKind, body: &str, decoder: &FeatureDecoder) -> Result<Vec<Parcel>> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        AbuttersError::query_failed(kind, format!("Malformed response: {}", e))
    })?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown service error");
        let code = error.get("code").and_then(Value::as_i64);
        let reason = match code {
            Some(code) => format!("Feature service error ({}): {}", code, message),
            None => format!("Feature service error: {}", message),
        };
        return Err(AbuttersError::query_failed(kind, reason));
    }

    let collection: FeatureCollection = serde_json::from_value(value).map_err(|e| {
        AbuttersError::query_failed(kind, format!("Response is not a FeatureCollection: {}", e))
    })?;
    Ok(decoder.decode_collection(&collection))
}

/// Esri JSON polygon for the `geometry` parameter
fn esri_polygon(geometry: &Geometry) -> Result<Value> {
    let rings: Vec<&Vec<[f64; 2]>> = match geometry {
        Geometry::Polygon { coordinates } => coordinates.iter().collect(),
        Geometry::MultiPolygon { coordinates } => coordinates.iter().flatten().collect(),
        other => {
            return Err(AbuttersError::invalid_geometry(format!(
                "intersection queries need a polygonal geometry, got {:?}",
                other.geometry_type()
            )))
        }
    };
    Ok(json!({
        "rings": rings,
        "spatialReference": { "wkid": 4326 },
    }))
}

/// SQL literal for a `where` clause. Single quotes are doubled.
fn where_literal(value: &AttributeValue) -> String {
    match value {
        AttributeValue::Number(_) => value.to_cell(),
        AttributeValue::Null => "NULL".to_string(),
        other => format!("'{}'", other.to_cell().replace('\'', "''")),
    }
}

fn where_clause(predicate: &FieldEquals) -> String {
    match predicate.value {
        AttributeValue::Null => format!("{} IS NULL", predicate.field),
        _ => format!("{} = {}", predicate.field, where_literal(&predicate.value)),
    }
}

#[async_trait]
impl SpatialQueryClient for ArcGisFeatureService {
    async fn query_contains(&self, point: LngLat) -> Result<Option<Parcel>> {
        let kind = QueryKind::Contains;
        let url = self.query_url(
            kind,
            &[
                ("geometry", format!("{},{}", point.lon, point.lat)),
                ("geometryType", "esriGeometryPoint".to_string()),
                ("spatialRel", "esriSpatialRelWithin".to_string()),
            ],
        )?;
        Ok(self.fetch(kind, url).await?.into_iter().next())
    }

    async fn query_intersects(&self, geometry: &Geometry) -> Result<Vec<Parcel>> {
        let url = self.intersects_url(geometry)?;
        self.fetch_form(QueryKind::Intersects, url).await
    }

    async fn query_attribute(&self, predicate: &FieldEquals) -> Result<Option<Parcel>> {
        let kind = QueryKind::Attribute;
        let url = self.query_url(kind, &[("where", where_clause(predicate))])?;
        Ok(self.fetch(kind, url).await?.into_iter().next())
    }
}
