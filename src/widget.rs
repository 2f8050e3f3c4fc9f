//! The annotation widget: store, controller and renderer behind one surface,
//! synced to a [`HostSink`].
//!
//! The host feeds it props on mount, layout updates and input events, and
//! asks it for frames. Values go back to the host only when an edit settles
//! or the user submits explicitly.

use crate::bridge::{ComponentProps, HostSink, ImageTicket, SizeFetchThread};
use crate::color_utils::LabelColorMap;
use crate::config::WidgetConfig;
use crate::constants::DEFAULT_CONTAINER_WIDTH;
use crate::controller::{Controller, EditMode, Key, PointerEvent, Response};
use crate::error::ValidationError;
use crate::geometry::DisplayTransform;
use crate::model::{BboxRecord, LabelList};
use crate::render::{Frame, PLACEHOLDER_HEIGHT, RenderState, render_frame};
use crate::sizing::DisplaySizing;
use crate::state::AnnotationStore;

/// Whether the current image can be edited yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Image size unknown; a placeholder is shown and input is ignored
    Loading,
    /// Image size known; fully interactive
    Ready,
}

/// Space the host gives the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Width of the column the widget sits in
    pub container_width: f32,
    /// Width of the whole host window, when known
    pub window_width: Option<f32>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            container_width: DEFAULT_CONTAINER_WIDTH,
            window_width: None,
        }
    }
}

/// A bounding-box annotation canvas bound to one host.
pub struct DetectionWidget<H: HostSink> {
    config: WidgetConfig,
    host: H,
    store: AnnotationStore,
    controller: Controller,
    color_map: LabelColorMap,
    line_width: f32,
    sizing: DisplaySizing,
    image_url: String,
    phase: LoadPhase,
    ticket: ImageTicket,
    fetcher: Option<SizeFetchThread>,
    layout: Layout,
    transform: DisplayTransform,
    display_width: f32,
    frame_height: Option<f32>,
    value: Option<Vec<BboxRecord>>,
}

impl<H: HostSink> DetectionWidget<H> {
    pub fn new(host: H, config: WidgetConfig) -> Self {
        config.apply_log_level();
        Self {
            controller: Controller::new(config.controller_settings(false)),
            line_width: config.default_line_width,
            config,
            host,
            store: AnnotationStore::new(LabelList::default()),
            color_map: LabelColorMap::default(),
            sizing: DisplaySizing::default(),
            image_url: String::new(),
            phase: LoadPhase::Loading,
            ticket: ImageTicket::default(),
            fetcher: None,
            layout: Layout::default(),
            transform: DisplayTransform::identity(),
            display_width: DEFAULT_CONTAINER_WIDTH,
            frame_height: None,
            value: None,
        }
    }

    /// Look up unknown image sizes on a background thread.
    pub fn with_size_fetcher(mut self, fetcher: SizeFetchThread) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Load a (new) image and its initial boxes.
    ///
    /// Any in-flight size fetch for the previous image becomes stale. Returns
    /// the ticket identifying this image for [`Self::resolve_image_size`].
    pub fn mount(&mut self, props: ComponentProps) -> ImageTicket {
        self.ticket = self.ticket.next();

        let ingested = props.ingest();
        self.store
            .initialize(&ingested.bboxes, &ingested.labels, props.label_list.clone());
        self.store.set_image_size(props.image_dimensions());

        let mode = self.controller.mode();
        self.controller = Controller::new(self.config.controller_settings(props.use_space));
        self.controller.set_mode(mode, &mut self.store);

        self.sizing = props.sizing();
        self.line_width = if props.line_width.is_finite() && props.line_width > 0.0 {
            props.line_width
        } else {
            self.config.default_line_width
        };
        self.color_map = if props.color_map.is_empty() {
            LabelColorMap::generate(props.label_list.names(), self.config.colormap)
        } else {
            props.color_map
        };
        self.image_url = props.image_url;
        self.value = None;

        if self.store.image_size().is_some() {
            self.phase = LoadPhase::Ready;
        } else {
            self.phase = LoadPhase::Loading;
            if let Some(fetcher) = self.fetcher.as_mut() {
                fetcher.request(self.ticket, &self.image_url);
            }
        }

        log::info!(
            "Mounted {} with {} boxes ({:?}, {:?})",
            self.image_url,
            self.store.len(),
            self.phase,
            self.ticket
        );
        self.update_layout();
        self.ticket
    }

    /// Supply the image size for the image identified by `ticket`.
    ///
    /// Results for any other image are dropped. Returns whether the size was
    /// applied.
    pub fn resolve_image_size(&mut self, ticket: ImageTicket, size: Option<(u32, u32)>) -> bool {
        if ticket != self.ticket {
            log::warn!("Dropping stale image size for {:?} (current {:?})", ticket, self.ticket);
            return false;
        }
        let Some((width, height)) = size else {
            log::warn!("Image size for {} is unknown, keeping placeholder", self.image_url);
            return false;
        };

        self.store.set_image_size(Some((width as f32, height as f32)));
        self.phase = LoadPhase::Ready;
        log::info!("Image {} is {}x{}", self.image_url, width, height);
        self.update_layout();
        true
    }

    /// Apply finished background fetches. Returns whether the image became ready.
    pub fn poll_size_fetch(&mut self) -> bool {
        let mut results = Vec::new();
        if let Some(fetcher) = self.fetcher.as_mut() {
            while let Some(result) = fetcher.take_one_result() {
                results.push(result);
            }
        }

        let mut applied = false;
        for result in results {
            applied |= self.resolve_image_size(result.ticket, result.size);
        }
        applied
    }

    /// Block until the size fetch for the current image finishes.
    pub fn wait_for_size(&mut self) -> bool {
        while self.phase == LoadPhase::Loading {
            let Some(result) = self.fetcher.as_mut().and_then(SizeFetchThread::wait_one_result)
            else {
                return false;
            };
            let current = result.ticket == self.ticket;
            if self.resolve_image_size(result.ticket, result.size) {
                return true;
            }
            if current {
                return false;
            }
        }
        true
    }

    /// The host resized the column or window.
    pub fn set_layout(&mut self, layout: Layout) {
        if self.layout != layout {
            self.layout = layout;
            self.update_layout();
        }
    }

    pub fn on_pointer(&mut self, event: PointerEvent) -> Response {
        let response = self.controller.handle_pointer(event, &mut self.store, &self.transform);
        self.sync(response);
        response
    }

    pub fn on_key(&mut self, key: Key) -> Response {
        let response = self.controller.handle_key(key, &mut self.store);
        self.sync(response);
        response
    }

    /// Pick the current label; relabels the selected box.
    pub fn select_label(&mut self, label_id: i64) -> Result<(), ValidationError> {
        let result = self.controller.select_label(label_id, &mut self.store);
        if let Err(e) = &result {
            log::warn!("Rejected label selection: {}", e);
        }
        self.sync(Response::Handled);
        result
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.controller.set_mode(mode, &mut self.store);
    }

    /// Send the current list to the host now, committed or not.
    pub fn complete(&mut self) {
        self.emit();
    }

    /// Produce the frame for the current state.
    ///
    /// Clears the store's dirty flag; the frame itself depends only on state.
    pub fn render(&mut self) -> Frame {
        let frame = render_frame(&RenderState {
            store: &self.store,
            interaction: self.controller.interaction(),
            color_map: &self.color_map,
            transform: self.transform,
            display_width: self.display_width,
            line_width: self.line_width,
        });
        self.store.clear_dirty();
        frame
    }

    /// Whether something changed since the last [`Self::render`].
    pub fn needs_redraw(&self) -> bool {
        self.store.is_dirty()
    }

    /// Last value sent to the host for this image.
    pub fn value(&self) -> Option<&[BboxRecord]> {
        self.value.as_deref()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn ticket(&self) -> ImageTicket {
        self.ticket
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn transform(&self) -> DisplayTransform {
        self.transform
    }

    pub fn color_map(&self) -> &LabelColorMap {
        &self.color_map
    }

    pub fn sizing(&self) -> DisplaySizing {
        self.sizing
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn sync(&mut self, response: Response) {
        let committed = self.store.take_pending_commit();
        if committed || response == Response::Submit {
            self.emit();
        }
    }

    fn emit(&mut self) {
        let records = self.store.records();
        log::info!("Sending {} boxes to host", records.len());
        self.host.set_component_value(&records);
        self.value = Some(records);
    }

    /// Recompute scale and display size, and tell the host when the frame
    /// height changes.
    fn update_layout(&mut self) {
        let container = self.layout.container_width;
        let image_width = self.store.image_size().map(|(w, _)| w);
        self.display_width = self.sizing.display_width(image_width, container);

        let height = match self.store.image_size() {
            Some((image_w, image_h)) if image_w > 0.0 => {
                let mut scale = self.display_width / image_w;
                if !self.sizing.allows_upscale() {
                    scale = scale.min(self.config.max_scale);
                }
                if let Some(window) = self.layout.window_width {
                    scale = scale.min(window * self.config.frame_width_ratio / image_w);
                }
                self.transform = DisplayTransform::new(scale, scale);
                let (width, height) = self.transform.display_size(image_w, image_h);
                self.display_width = width;
                height
            }
            _ => {
                self.transform = DisplayTransform::identity();
                PLACEHOLDER_HEIGHT
            }
        };

        self.store.mark_dirty();
        if self.frame_height != Some(height) {
            log::debug!("Frame height {} -> {}", self.frame_height.unwrap_or(0.0), height);
            self.frame_height = Some(height);
            self.host.set_frame_height(height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{RecordingHost, StaticSizeFetcher};
    use crate::color_utils::Colormap;
    use crate::geometry::{BoundingBox, Point};
    use crate::model::BboxInfo;
    use crate::sizing::WidthBehavior;

    fn props(image_size: Option<[u32; 2]>) -> ComponentProps {
        let label_list = LabelList::new(["deer", "human"]);
        ComponentProps {
            image_url: "http://localhost:8501/media/a.jpg".to_string(),
            image_size,
            color_map: LabelColorMap::generate(label_list.names(), Colormap::GistRainbow),
            label_list,
            bbox_info: vec![BboxInfo {
                bbox: [0.0, 0.0, 100.0, 100.0],
                label_id: 0,
                label: "deer".to_string(),
            }],
            line_width: 5.0,
            use_space: true,
            width: WidthBehavior::MinImageOrContainer.code(),
        }
    }

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn widget() -> DetectionWidget<RecordingHost> {
        DetectionWidget::new(RecordingHost::new(), WidgetConfig::default())
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

    #[test]
    fn test_mount_does_not_emit() {
        let mut w = widget();
        w.mount(props(Some([640, 480])));
        assert_eq!(w.phase(), LoadPhase::Ready);
        assert_eq!(w.store().len(), 1);
        assert_eq!(w.host().emission_count(), 0);
        assert_eq!(w.value(), None);
    }

    #[test]
    fn test_drag_emits_once() {
        let mut w = widget();
        w.mount(props(Some([640, 480])));
        drag(&mut w, (200.0, 200.0), (300.0, 260.0));

        assert_eq!(w.host().emission_count(), 1);
        let value = w.value().unwrap();
        assert_eq!(value.len(), 2);
        assert_eq!(value[1].bbox, [200.0, 200.0, 100.0, 60.0]);
        assert_eq!(value[1].label_id, 0);
    }

    #[test]
    fn test_scale_capped_and_frame_height_reported() {
        let mut w = widget();
        // 1280 wide image in a 704 container: scale 0.55
        w.mount(props(Some([1280, 960])));
        assert!(approx_eq(w.transform().scale_x, 0.55));
        assert!(approx_eq(*w.host().frame_heights.last().unwrap(), 528.0));

        // Window share caps it further: 1000 * 0.8 / 1280 = 0.625 > 0.55, no change
        w.set_layout(Layout {
            container_width: 704.0,
            window_width: Some(1000.0),
        });
        assert_eq!(w.host().frame_heights.len(), 1);

        w.set_layout(Layout {
            container_width: 704.0,
            window_width: Some(640.0),
        });
        // 640 * 0.8 / 1280 = 0.4
        assert!(approx_eq(w.transform().scale_x, 0.4));
        assert!(approx_eq(*w.host().frame_heights.last().unwrap(), 384.0));
    }

    #[test]
    fn test_small_image_never_upscaled() {
        let mut w = widget();
        w.mount(props(Some([200, 100])));
        assert_eq!(w.transform(), DisplayTransform::identity());
        assert_eq!(w.render().width, 200.0);
    }

    #[test]
    fn test_pointer_in_display_space() {
        let mut w = widget();
        w.mount(props(Some([1408, 1056])));
        // scale 0.5
        drag(&mut w, (100.0, 100.0), (150.0, 125.0));
        let value = w.value().unwrap();
        assert_eq!(value[1].bbox, [200.0, 200.0, 100.0, 50.0]);
    }

    #[test]
    fn test_space_submits_without_commit() {
        let mut w = widget();
        w.mount(props(Some([640, 480])));
        assert_eq!(w.on_key(Key::Space), Response::Submit);
        assert_eq!(w.host().emission_count(), 1);
        assert_eq!(w.value().unwrap().len(), 1);
    }

    #[test]
    fn test_complete_emits_current_list() {
        let mut w = widget();
        w.mount(props(Some([640, 480])));
        w.complete();
        assert_eq!(w.host().last_value().unwrap()[0].bbox, [0.0, 0.0, 100.0, 100.0]);
    }

    #[test]
    fn test_unsized_until_resolved() {
        let mut w = widget();
        let ticket = w.mount(props(None));
        assert_eq!(w.phase(), LoadPhase::Loading);
        assert_eq!(w.on_pointer(PointerEvent::Down(Point::new(10.0, 10.0))), Response::Ignored);
        assert_eq!(w.host().frame_heights.last(), Some(&PLACEHOLDER_HEIGHT));

        assert!(!w.resolve_image_size(ticket, None));
        assert_eq!(w.phase(), LoadPhase::Loading);

        assert!(w.resolve_image_size(ticket, Some((640, 480))));
        assert_eq!(w.phase(), LoadPhase::Ready);
        assert_eq!(w.host().frame_heights.last(), Some(&480.0));
    }

    #[test]
    fn test_stale_size_dropped_after_image_change() {
        let mut w = widget();
        let first = w.mount(props(None));
        let second = w.mount(props(None));
        assert_ne!(first, second);

        assert!(!w.resolve_image_size(first, Some((640, 480))));
        assert_eq!(w.phase(), LoadPhase::Loading);
        assert!(w.resolve_image_size(second, Some((320, 240))));
        assert_eq!(w.store().image_size(), Some((320.0, 240.0)));
    }

    #[test]
    fn test_background_fetch_resolves_size() {
        let fetcher =
            StaticSizeFetcher::new().with("http://localhost:8501/media/a.jpg", (640, 480));
        let thread = SizeFetchThread::spawn(Box::new(fetcher)).unwrap();
        let mut w = widget().with_size_fetcher(thread);

        w.mount(props(None));
        assert!(w.wait_for_size());
        assert_eq!(w.phase(), LoadPhase::Ready);
        assert_eq!(w.store().image_size(), Some((640.0, 480.0)));
    }

    #[test]
    fn test_rejected_label_keeps_state() {
        let mut w = widget();
        w.mount(props(Some([640, 480])));
        w.on_pointer(PointerEvent::Down(Point::new(50.0, 50.0)));
        w.on_pointer(PointerEvent::Up(Point::new(50.0, 50.0)));
        assert!(w.select_label(99).is_err());
        assert_eq!(w.host().emission_count(), 0);
        assert_eq!(w.store().records()[0].label_id, 0);

        w.select_label(1).unwrap();
        assert_eq!(w.host().last_value().unwrap()[0].label_id, 1);
    }

    #[test]
    fn test_mount_resets_value_and_selection() {
        let mut w = widget();
        w.mount(props(Some([640, 480])));
        drag(&mut w, (200.0, 200.0), (300.0, 260.0));
        assert!(w.value().is_some());

        w.mount(props(Some([640, 480])));
        assert_eq!(w.value(), None);
        assert_eq!(w.store().selected(), None);
        assert_eq!(w.store().get(1).map(|a| a.bbox), None);
        assert_eq!(
            w.store().iter().next().map(|a| a.bbox),
            Some(BoundingBox::new(0.0, 0.0, 100.0, 100.0))
        );
    }
}
