//! HTML and JSON presentation of retrieved events.

use dioxus::prelude::*;
use serde::Serialize;

use crate::backend::model::Event;

/// Output encoding of a retrieval entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Json,
}

/// What a retrieval hands to the presentation layer.
///
/// Serialized as `{Name, Data, Notice, Events}`; dashboards built against
/// the service read those keys. `Name` and `Data` are always empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Page {
    pub name: String,
    pub data: String,
    /// Shown to the reader when events couldn't be fetched.
    pub notice: String,
    pub events: Vec<Event>,
}

impl Page {
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn with_notice(notice: impl Into<String>) -> Self {
        Self {
            notice: notice.into(),
            ..Self::default()
        }
    }
}

/// Sent in place of a page that failed to serialize.
pub const ENCODING_FAILED_JSON: &str =
    r#"{"Name":"","Data":"","Notice":"Couldn't encode latest events. Refresh?","Events":[]}"#;

pub fn to_json(page: &Page) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(page)
}

pub trait Renderer: Send + Sync {
    fn render_html(&self, page: &Page) -> String;
}

/// The dashboard page served at `/`.
#[derive(Debug, Clone, Default)]
pub struct IndexPage {
    pub title: String,
}

impl IndexPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Renderer for IndexPage {
    fn render_html(&self, page: &Page) -> String {
        let mut dom = VirtualDom::new_with_props(
            EventsPage,
            EventsPageProps {
                title: self.title.clone(),
                notice: page.notice.clone(),
                events: page.events.clone(),
            },
        );
        dom.rebuild_in_place();
        format!("<!DOCTYPE html><html lang=\"en\">{}</html>", dioxus::ssr::render(&dom))
    }
}

#[allow(non_snake_case)]
#[component]
fn EventsPage(title: String, notice: String, events: Vec<Event>) -> Element {
    rsx! {
        head {
            meta { charset: "utf-8" }
            title { "{title}" }
            script { src: "https://cdn.plot.ly/plotly-1.58.5.min.js" }
            script { src: "/static/plot.js" }
        }
        body {
            h1 { "{title}" }
            if !notice.is_empty() {
                p { class: "notice", "{notice}" }
            }
            div { id: "EventPlot" }
            table {
                thead {
                    tr {
                        th { "Published" }
                        th { "Event" }
                        th { "Data" }
                    }
                }
                tbody {
                    for event in events.iter() {
                        {
                            let published = event.time.to_rfc3339();
                            let name = &event.name;
                            let data = &event.data;
                            rsx! {
                                tr {
                                    td { "{published}" }
                                    td { "{name}" }
                                    td { "{data}" }
                                }
                            }
                        }
                    }
                }
            }
            script { "plotMetrics({{}});" }
        }
    }
}
