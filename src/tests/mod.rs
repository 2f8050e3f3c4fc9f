//! Cross-module tests for the annotation widget.
//!
//! Unit tests live next to their modules; these drive the widget end to end
//! through the bridge and check properties that span store, controller and
//! renderer.


use crate::bridge::{
    ComponentProps, DetectionRequest, ImageSource, InMemoryMediaStore, RecordingHost,
    StaticSizeFetcher,
};
use crate::config::WidgetConfig;
use crate::controller::PointerEvent;
use crate::geometry::Point;
use crate::widget::DetectionWidget;

const ORIGIN: &str = "http://localhost:8501";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Props for a URL image of the given size, built through the request path.
fn props_for(
    size: (u32, u32),
    labels: &[&str],
    bboxes: Vec<[f32; 4]>,
    label_ids: Vec<i64>,
) -> ComponentProps {
    let url = format!("{}/media/scene.jpg", ORIGIN);
    let mut media = InMemoryMediaStore::new(ORIGIN);
    let fetcher = StaticSizeFetcher::new().with(url.clone(), size);
    DetectionRequest::new(ImageSource::Url(url), labels.iter().copied())
        .boxes(bboxes, label_ids)
        .build_props(&mut media, &fetcher)
        .unwrap()
}

fn mounted(props: ComponentProps) -> DetectionWidget<RecordingHost> {
    init_logging();
    let mut widget = DetectionWidget::new(RecordingHost::new(), WidgetConfig::default());
    widget.mount(props);
    widget
}

fn drag(widget: &mut DetectionWidget<RecordingHost>, from: (f32, f32), to: (f32, f32)) {
    widget.on_pointer(PointerEvent::Down(Point::new(from.0, from.1)));
    widget.on_pointer(PointerEvent::Move(Point::new(
        (from.0 + to.0) / 2.0,
        (from.1 + to.1) / 2.0,
    )));
    widget.on_pointer(PointerEvent::Move(Point::new(to.0, to.1)));
    widget.on_pointer(PointerEvent::Up(Point::new(to.0, to.1)));
}
