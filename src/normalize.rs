use chrono::DateTime;
use serde_json::Value;

use crate::models::{EpisodeDetails, NormalizedItem, RawPayload};

/// Flattens a tagged provider payload into the common display shape.
///
/// Total over its input: missing fields become neutral values and a payload
/// that does not contain the expected item array normalizes to zero items.
/// Pure, so normalizing the same payload twice yields identical output.
#[must_use]
pub fn normalize(payload: &RawPayload) -> Vec<NormalizedItem> {
    match payload {
        RawPayload::Taddy(v) => normalize_taddy(v),
        RawPayload::ListenNotes(v) => normalize_listen_notes(v),
        RawPayload::YouTube(v) => normalize_youtube(v),
    }
}

fn normalize_taddy(value: &Value) -> Vec<NormalizedItem> {
    if let Some(series) = array_at(value, "/data/searchForTerm/podcastSeries") {
        return series.iter().map(taddy_series_item).collect();
    }
    if let Some(episodes) = array_at(value, "/data/searchForTerm/podcastEpisodes") {
        return episodes.iter().map(taddy_episode_item).collect();
    }
    Vec::new()
}

fn taddy_series_item(v: &Value) -> NormalizedItem {
    NormalizedItem {
        title: str_field(v, "name"),
        artwork_url: str_field(v, "imageUrl"),
        description: str_field(v, "description"),
        publisher: str_field(v, "authorName"),
        explicit: v
            .get("isExplicitContent")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        categories: str_list(v.get("genres")),
        feed_url: str_field(v, "rssUrl"),
        provider_ref: id_field(v, "itunesId"),
        uuid: str_field(v, "uuid"),
        episode: None,
    }
}

fn taddy_episode_item(v: &Value) -> NormalizedItem {
    let series = v.get("podcastSeries").cloned().unwrap_or(Value::Null);

    let published = v
        .get("datePublished")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default();

    NormalizedItem {
        // Show-level metadata comes from the parent series; episode-level
        // title/date/duration live in EpisodeDetails.
        title: str_field(&series, "name"),
        artwork_url: str_field(&series, "imageUrl"),
        description: str_field(v, "description"),
        publisher: String::new(),
        explicit: false,
        categories: Vec::new(),
        feed_url: str_field(&series, "rssUrl"),
        provider_ref: id_field(&series, "itunesId"),
        uuid: str_field(&series, "uuid"),
        episode: Some(EpisodeDetails {
            title: str_field(v, "name"),
            published,
            duration_secs: v.get("duration").and_then(Value::as_u64).unwrap_or(0),
        }),
    }
}

fn normalize_listen_notes(value: &Value) -> Vec<NormalizedItem> {
    let Some(results) = value.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    results.iter().map(listen_notes_item).collect()
}

fn listen_notes_item(v: &Value) -> NormalizedItem {
    let categories = v
        .get("genre_ids")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_i64)
                .map(|id| id.to_string())
                .collect()
        })
        .unwrap_or_default();

    // Episode-typed results carry audio metadata alongside the parent
    // podcast object; podcast-typed results do not.
    let episode = v.get("audio_length_sec").and_then(Value::as_u64).map(|d| {
        let published = v
            .get("pub_date_ms")
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        EpisodeDetails {
            title: str_field(v, "title_original"),
            published,
            duration_secs: d,
        }
    });

    let podcast = v.get("podcast").cloned().unwrap_or(Value::Null);
    let (title, rss, itunes) = if episode.is_some() && !podcast.is_null() {
        (
            str_field(&podcast, "title_original"),
            str_field(&podcast, "rss"),
            id_field(&podcast, "itunes_id"),
        )
    } else {
        (
            str_field(v, "title_original"),
            str_field(v, "rss"),
            id_field(v, "itunes_id"),
        )
    };

    NormalizedItem {
        title,
        artwork_url: str_field(v, "image"),
        description: str_field(v, "description_original"),
        publisher: str_field(v, "publisher_original"),
        explicit: v
            .get("explicit_content")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        categories,
        feed_url: rss,
        provider_ref: itunes,
        uuid: str_field(v, "id"),
        episode,
    }
}

fn normalize_youtube(value: &Value) -> Vec<NormalizedItem> {
    let Some(items) = value.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };
    items.iter().map(youtube_item).collect()
}

fn youtube_item(v: &Value) -> NormalizedItem {
    let snippet = v.get("snippet").cloned().unwrap_or(Value::Null);

    NormalizedItem {
        title: str_field(&snippet, "title"),
        artwork_url: snippet
            .pointer("/thumbnails/high/url")
            .or_else(|| snippet.pointer("/thumbnails/default/url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        description: str_field(&snippet, "description"),
        publisher: str_field(&snippet, "channelTitle"),
        explicit: false,
        categories: Vec::new(),
        feed_url: String::new(),
        provider_ref: v
            .pointer("/id/videoId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        uuid: String::new(),
        episode: Some(EpisodeDetails {
            title: str_field(&snippet, "title"),
            published: str_field(&snippet, "publishedAt"),
            duration_secs: 0,
        }),
    }
}

fn array_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a Vec<Value>> {
    value.pointer(pointer).and_then(Value::as_array)
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Identifier fields arrive as numbers or strings depending on provider and
/// endpoint; both are preserved verbatim.
fn id_field(value: &Value, field: &str) -> String {
    match value.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn str_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn taddy_series_payload() -> RawPayload {
        RawPayload::Taddy(json!({
            "data": { "searchForTerm": {
                "searchId": "abc",
                "podcastSeries": [{
                    "uuid": "d682a935-ad2d-46ee-a0ac-139198b83bcc",
                    "name": "Climate One",
                    "description": "Conversations about the climate",
                    "rssUrl": "https://feeds.example.com/climateone",
                    "imageUrl": "https://img.example.com/c1.jpg",
                    "itunesId": 388_487_754,
                    "authorName": "Climate One",
                    "isExplicitContent": false,
                    "genres": ["PODCASTSERIES_SCIENCE"]
                }]
            }}
        }))
    }

    #[test]
    fn taddy_series_maps_all_fields() {
        let items = normalize(&taddy_series_payload());
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "Climate One");
        assert_eq!(item.feed_url, "https://feeds.example.com/climateone");
        assert_eq!(item.provider_ref, "388487754");
        assert_eq!(item.uuid, "d682a935-ad2d-46ee-a0ac-139198b83bcc");
        assert_eq!(item.categories, vec!["PODCASTSERIES_SCIENCE"]);
        assert!(item.episode.is_none());
        assert!(item.has_identifier());
    }

    #[test]
    fn taddy_episode_keeps_episode_and_show_metadata_distinct() {
        let payload = RawPayload::Taddy(json!({
            "data": { "searchForTerm": {
                "podcastEpisodes": [{
                    "uuid": "ep-uuid",
                    "name": "Heat waves explained",
                    "description": "What makes heat waves worse",
                    "datePublished": 1_704_067_200,
                    "duration": 1800,
                    "podcastSeries": {
                        "uuid": "show-uuid",
                        "name": "Climate One",
                        "rssUrl": "https://feeds.example.com/climateone",
                        "imageUrl": "https://img.example.com/c1.jpg",
                        "itunesId": 388_487_754
                    }
                }]
            }}
        }));
        let items = normalize(&payload);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "Climate One");
        let episode = item.episode.as_ref().unwrap();
        assert_eq!(episode.title, "Heat waves explained");
        assert_eq!(episode.duration_secs, 1800);
        assert!(episode.published.starts_with("2024-01-01"));
    }

    #[test]
    fn listen_notes_podcast_results_map() {
        let payload = RawPayload::ListenNotes(json!({
            "count": 1,
            "results": [{
                "id": "4d3fe717742d4963a85562e9f84d8c79",
                "title_original": "This American Life",
                "publisher_original": "WBEZ",
                "image": "https://img.example.com/tal.jpg",
                "description_original": "Stories",
                "rss": "https://feeds.example.com/tal",
                "itunes_id": 201_671_138,
                "genre_ids": [122, 67],
                "explicit_content": false
            }]
        }));
        let items = normalize(&payload);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.publisher, "WBEZ");
        assert_eq!(item.provider_ref, "201671138");
        assert_eq!(item.uuid, "4d3fe717742d4963a85562e9f84d8c79");
        assert_eq!(item.categories, vec!["122", "67"]);
        assert!(item.episode.is_none());
    }

    #[test]
    fn youtube_items_map_to_episode_shaped_results() {
        let payload = RawPayload::YouTube(json!({
            "items": [{
                "id": { "videoId": "dQw4w9WgXcQ" },
                "snippet": {
                    "title": "Climate explained",
                    "description": "A primer",
                    "channelTitle": "Science Channel",
                    "publishedAt": "2024-05-01T10:00:00Z",
                    "thumbnails": { "high": { "url": "https://img.example.com/v.jpg" } }
                }
            }]
        }));
        let items = normalize(&payload);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.provider_ref, "dQw4w9WgXcQ");
        assert_eq!(item.publisher, "Science Channel");
        assert_eq!(item.artwork_url, "https://img.example.com/v.jpg");
        assert_eq!(item.episode.as_ref().unwrap().published, "2024-05-01T10:00:00Z");
    }

    #[test]
    fn malformed_payloads_normalize_to_zero_items() {
        for payload in [
            RawPayload::Taddy(json!({"unexpected": true})),
            RawPayload::ListenNotes(json!("just a string")),
            RawPayload::YouTube(json!(null)),
            RawPayload::Taddy(json!({"data": {"searchForTerm": null}})),
        ] {
            assert!(normalize(&payload).is_empty());
        }
    }

    #[test]
    fn partial_items_get_neutral_fields_not_nulls() {
        let payload = RawPayload::ListenNotes(json!({
            "results": [{ "id": "only-an-id" }]
        }));
        let items = normalize(&payload);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.title, "");
        assert!(!item.explicit);
        assert!(item.categories.is_empty());
        assert!(item.has_identifier());
    }

    #[test]
    fn normalization_is_idempotent() {
        let payload = taddy_series_payload();
        assert_eq!(normalize(&payload), normalize(&payload));
    }
}
