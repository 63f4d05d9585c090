//! Typst source emitter
//!
//! Turns a resolved [`Document`] into one Typst source file. Each rendered
//! page becomes a block of `layer_grid` placements on a shared page size;
//! master elements are merged in and everything is stacked by `z`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pagegrid_ast::{
    Area, Document, Element, ElementType, FigureRef, Flow, Page, Payload, PdfRef, RectSpec,
    ScaleMode, SvgRef, TextBlock, VAlign,
};
use pagegrid_core::fonts::{missing_font_warnings, FontCatalog};
use pagegrid_core::layout::PageGeometry;
use pagegrid_core::style::{par_args, text_args, Style, StyleSheet};
use pagegrid_core::parse_bool;

use crate::helpers::preamble;
use crate::pdf_size::PdfSizeCache;
use crate::text::{escape_text, render_blocks};

const DEFAULT_RECT_COLOR: &str = "#3498db";

/// Result of emitting a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmitOutput {
    /// Typst source
    pub source: String,
    /// Non-fatal issues found while emitting
    pub warnings: Vec<String>,
}

/// Typst emitter
///
/// Holds the PDF size cache across documents, so repeated emits of the same
/// deck do not re-read PDF headers.
///
/// # Example
///
/// ```
/// use pagegrid_typst::Emitter;
///
/// let doc = pagegrid_core::parse("* Cover\n** Title\n:PROPERTIES:\n:TYPE: header\n:END:\nHello\n").unwrap();
/// let out = Emitter::new().emit(&doc);
/// assert!(out.source.contains("// Page 1: Cover"));
/// ```
#[derive(Default)]
pub struct Emitter {
    fonts: Option<Box<dyn FontCatalog>>,
    pdf_sizes: PdfSizeCache,
    asset_root: Option<PathBuf>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check style fonts against a catalog
    pub fn with_fonts(mut self, catalog: Box<dyn FontCatalog>) -> Self {
        self.fonts = Some(catalog);
        self
    }

    /// Directory relative asset paths are resolved against for size lookups
    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    /// Emit Typst source for a document
    pub fn emit(&mut self, doc: &Document) -> EmitOutput {
        let styles = StyleSheet::from_meta(&doc.meta);
        let mut warnings: Vec<String> = styles.warnings().to_vec();

        if let Some(catalog) = &self.fonts {
            for warning in missing_font_warnings(&styles, catalog.as_ref()) {
                log::warn!("{}", warning);
                warnings.push(warning);
            }
        }

        let mut source = preamble(doc);
        let pages: Vec<&Page> = doc.rendered_pages().collect();
        let grid_debug = doc
            .meta("GRID_DEBUG")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        for (idx, page) in pages.iter().enumerate() {
            let mut ctx = PageContext {
                doc,
                page,
                geometry: PageGeometry::of(page),
                styles: &styles,
                warnings: &mut warnings,
                seen: HashSet::new(),
            };
            source.push_str(&format!("// Page {}: {}\n", idx + 1, page.title));
            source.push_str(&ctx.grid_params());
            source.push_str("// BEGIN PAGE CONTENT\n");

            let mut elements: Vec<&Element> = Vec::new();
            if let Some(master) = page.master.as_deref().and_then(|m| doc.master(m)) {
                elements.extend(master.elements.iter());
            }
            elements.extend(page.elements.iter());
            elements.sort_by_key(|el| el.z);

            for el in elements {
                if !el.kind.is_rendered() {
                    log::debug!("Skipping element {} ({})", el.id, el.kind.as_str());
                    continue;
                }
                source.push_str(&ctx.element(el, &mut self.pdf_sizes, self.asset_root.as_deref()));
            }

            if grid_debug {
                match ctx.geometry.margins {
                    Some(_) => source.push_str("#draw_total_grid(gp)\n"),
                    None => source.push_str(&format!(
                        "#draw_grid({}, {}, cw, ch)\n",
                        ctx.geometry.cols, ctx.geometry.rows
                    )),
                }
            }
            source.push_str("// END PAGE CONTENT\n");
            if idx + 1 < pages.len() {
                source.push_str("#pagebreak()\n");
            }
            source.push('\n');
        }

        log::debug!("Emitted {} pages, {} warnings", pages.len(), warnings.len());
        EmitOutput { source, warnings }
    }
}

/// Emit with a fresh emitter and no font catalog
pub fn emit(doc: &Document) -> EmitOutput {
    Emitter::new().emit(doc)
}

struct PageContext<'a> {
    doc: &'a Document,
    page: &'a Page,
    geometry: PageGeometry,
    styles: &'a StyleSheet,
    warnings: &'a mut Vec<String>,
    seen: HashSet<(String, Area)>,
}

impl PageContext<'_> {
    fn grid_params(&self) -> String {
        let g = &self.geometry;
        match g.margins {
            Some(m) => format!(
                "#let cw = ({}mm - ({:?}mm + {:?}mm)) / {}\n\
                 #let ch = ({}mm - ({:?}mm + {:?}mm)) / {}\n\
                 #let gp = (lc: 1, rc: 1, lr: 1, br: 1, cc: {}, cr: {}, lm: {:?}mm, rm: {:?}mm, tm: {:?}mm, bm: {:?}mm, cw: cw, ch: ch)\n",
                g.w_mm, m.left, m.right, g.cols,
                g.h_mm, m.top, m.bottom, g.rows,
                g.cols, g.rows, m.left, m.right, m.top, m.bottom
            ),
            None => format!(
                "#let cw = {}mm / {}\n\
                 #let ch = {}mm / {}\n\
                 #let gp = (lc: 0, rc: 0, lr: 0, br: 0, cc: {}, cr: {}, lm: 0mm, rm: 0mm, tm: 0mm, bm: 0mm, cw: cw, ch: ch)\n",
                g.w_mm, g.cols, g.h_mm, g.rows, g.cols, g.rows
            ),
        }
    }

    fn element(&mut self, el: &Element, pdf_sizes: &mut PdfSizeCache, asset_root: Option<&Path>) -> String {
        let area = el.area.unwrap_or_else(|| self.geometry.default_area());
        if !self.geometry.contains(&area) && self.seen.insert((el.id.clone(), area)) {
            let warning = format!(
                "AREA out-of-bounds for element {} on page {}: ({},{},{},{})",
                el.id, self.page.title, area.x, area.y, area.w, area.h
            );
            log::warn!("{}", warning);
            self.warnings.push(warning);
        }

        let mut pre_comments = Vec::new();
        let mut fragments = Vec::new();
        match (&el.kind, &el.payload) {
            (kind, _) if kind.is_text() => fragments.push(self.text(el)),
            (ElementType::Rectangle, Payload::Rectangle(rect)) => fragments.push(self.rectangle(el, rect)),
            (ElementType::Figure, Payload::Figure(fig)) => fragments.extend(figure(el, fig)),
            (ElementType::Svg, Payload::Svg(svg)) => fragments.extend(svg_image(svg)),
            (ElementType::Pdf, Payload::Pdf(pdf)) => {
                if let Some(src) = pdf.src.as_deref() {
                    let scale = || self.pdf_scale(&area, el, pdf, src, pdf_sizes, asset_root);
                    match embed_pdf(src, pdf, scale) {
                        (Some(comment), fragment) => {
                            pre_comments.push(comment);
                            fragments.push(fragment);
                        }
                        (None, fragment) => fragments.push(fragment),
                    }
                }
            }
            (ElementType::Toc, _) => fragments.push(self.toc()),
            _ => {}
        }

        let content = if fragments.is_empty() {
            "\"\"".to_string()
        } else {
            fragments.join(" + ")
        };
        let content = wrap_alignment(el, content);

        let mut out = String::new();
        for comment in pre_comments {
            out.push_str(&comment);
            out.push('\n');
        }
        out.push_str(&format!("// Element {} ({})\n", el.id, el.kind.as_str()));
        if let Some(flow) = el.flow {
            out.push_str(&format!("// FLOW: {}\n", flow.as_str()));
        }

        let arg = placement_arg(&content);
        match &el.padding_mm {
            Some(p) => out.push_str(&format!(
                "#layer_grid_padded(gp,{},{},{},{}, {:?}mm, {:?}mm, {:?}mm, {:?}mm, {})\n",
                area.x, area.y, area.w, area.h, p.top, p.right, p.bottom, p.left, arg
            )),
            None => out.push_str(&format!(
                "#layer_grid(gp,{},{},{},{}, {})\n",
                area.x, area.y, area.w, area.h, arg
            )),
        }
        out
    }

    fn text(&self, el: &Element) -> String {
        let style = self.styles.for_element(el);
        let targs = text_args(&style);
        let pargs = par_args(&style, el.justify);
        let blocks = el.text_blocks();
        if blocks.is_empty() {
            let title = TextBlock::Plain {
                content: el.title.clone(),
            };
            return render_blocks(std::slice::from_ref(&title), &targs, &pargs);
        }
        render_blocks(blocks, &targs, &pargs)
    }

    fn rectangle(&self, el: &Element, rect: &RectSpec) -> String {
        let style = self.styles.for_element(el);
        rectangle_call(rect, &style)
    }

    fn pdf_scale(
        &self,
        area: &Area,
        el: &Element,
        pdf: &PdfRef,
        src: &str,
        pdf_sizes: &mut PdfSizeCache,
        asset_root: Option<&Path>,
    ) -> f64 {
        let (frame_w, frame_h) = self.geometry.frame_size(area, el.padding_mm.as_ref());
        let path = match asset_root {
            Some(root) if Path::new(src).is_relative() => root.join(src),
            _ => PathBuf::from(src),
        };
        let (pdf_w, pdf_h) = pdf_sizes.size_mm(&path);
        let (rx, ry) = (frame_w / pdf_w, frame_h / pdf_h);
        let scale = match pdf.scale_mode {
            ScaleMode::Contain => rx.min(ry),
            ScaleMode::Cover => rx.max(ry),
        };
        if scale.is_nan() || scale <= 0.0 {
            return 1.0;
        }
        // Six decimals, as Typst receives it
        format!("{:.6}", scale).parse().unwrap_or(1.0)
    }

    fn toc(&self) -> String {
        let entries: Vec<String> = self
            .doc
            .rendered_pages()
            .enumerate()
            .filter(|(_, p)| p.prop("TOC_IGNORE").and_then(parse_bool) != Some(true))
            .map(|(idx, p)| toc_entry(&escape_text(&p.title), idx + 1))
            .collect();
        if entries.is_empty() {
            "[#text(font: \"Inter\")[No pages to display]]".to_string()
        } else {
            format!("[{}]", entries.join("\n"))
        }
    }
}

fn toc_entry(title: &str, page_no: usize) -> String {
    format!(
        "#grid(columns: (auto, 1fr, auto), gutter: 4pt, [#text(font: \"Inter\")[{}]], [#align(center)[#text(font: \"Inter\")[#repeat[.]]]], [#text(font: \"Inter\")[{}]])",
        title, page_no
    )
}

fn contained_image(src: &str) -> String {
    format!(
        "Fig(image(\"{}\", width: 100%, height: 100%, fit: \"contain\"))",
        src
    )
}

/// SVG contained in the frame, or sized to `scale` of the frame width
fn svg_image(svg: &SvgRef) -> Option<String> {
    let src = svg.src.as_deref()?;
    Some(match svg.scale.filter(|s| *s > 0.0) {
        Some(scale) => format!("Fig(image(\"{}\", width: {:?}%))", src, scale * 100.0),
        None => contained_image(src),
    })
}

fn figure(el: &Element, fig: &FigureRef) -> Option<String> {
    let src = fig.src.as_deref()?;
    let align = el.align.map_or("left", |a| a.as_str());
    let fit = match fig.fit.trim().to_lowercase().as_str() {
        "fill" => "cover".to_string(),
        other => other.to_string(),
    };
    let image = format!(
        "image(\"{}\", width: 100%, height: 100%, fit: \"{}\")",
        src, fit
    );
    Some(match fig.caption.as_deref().filter(|c| !c.is_empty()) {
        Some(caption) => format!(
            "Fig({}, caption: [{}], caption_align: {}, img_align: {})",
            image,
            escape_text(caption),
            align,
            align
        ),
        None => format!("Fig({}, caption_align: {}, img_align: {})", image, align, align),
    })
}

/// `PdfEmbed(..)` for a `.pdf` source, with the scaling comment when the
/// scale is computed; other sources are embedded as images
fn embed_pdf(src: &str, pdf: &PdfRef, auto_scale: impl FnOnce() -> f64) -> (Option<String>, String) {
    let is_pdf = Path::new(src)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return (None, contained_image(src));
    }

    let (comment, scale) = match pdf.scale {
        Some(scale) => (None, scale),
        None => {
            let comment = match pdf.scale_mode {
                ScaleMode::Contain => "// auto pdf scale base contain applied",
                ScaleMode::Cover => "// auto pdf scale base cover (may crop) applied",
            };
            (Some(comment.to_string()), auto_scale())
        }
    };
    (
        comment,
        format!("PdfEmbed(\"{}\", page: {}, scale: {:?})", src, pdf.page, scale),
    )
}

/// Element fields win over style fields
fn rectangle_call(rect: &RectSpec, style: &Style) -> String {
    let pick = |own: &Option<String>, styled: &Option<String>| {
        own.as_deref()
            .or(styled.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let color = pick(&rect.color, &style.color).unwrap_or_else(|| DEFAULT_RECT_COLOR.to_string());
    let alpha = rect
        .alpha
        .or_else(|| {
            style
                .alpha
                .as_deref()
                .map(|a| a.trim().parse::<f64>().unwrap_or(1.0))
        })
        .unwrap_or(1.0);
    let alpha = if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) };
    let stroke = pick(&rect.stroke, &style.stroke);
    let stroke_color = pick(&rect.stroke_color, &style.stroke_color).unwrap_or_else(|| color.clone());
    let radius = pick(&rect.radius, &style.radius);

    match (radius, stroke) {
        (Some(radius), stroke) => {
            let (stroke, stroke_color) = match stroke {
                Some(s) => (format!("\"{}\"", s), format!("\"{}\"", stroke_color)),
                None => ("none".to_string(), "none".to_string()),
            };
            format!(
                "ColorRect(\"{}\", {:?}, stroke: {}, stroke_color: {}, radius: \"{}\")",
                color, alpha, stroke, stroke_color, radius
            )
        }
        (None, Some(stroke)) => format!(
            "ColorRect(\"{}\", {:?}, stroke: {}, stroke_color: \"{}\")",
            color, alpha, stroke, stroke_color
        ),
        (None, None) => format!("ColorRect(\"{}\", {:?})", color, alpha),
    }
}

fn valign_term(valign: VAlign) -> &'static str {
    match valign {
        VAlign::Top => "top",
        VAlign::Middle => "horizon",
        VAlign::Bottom => "bottom",
    }
}

/// Wrap content in `align(..)[..]` from ALIGN, VALIGN, and FLOW
fn wrap_alignment(el: &Element, content: String) -> String {
    let valign = el.valign.map(valign_term).or(match el.flow {
        Some(Flow::BottomUp) => Some("bottom"),
        Some(Flow::CenterOut) => Some("horizon"),
        _ => None,
    });
    let terms: Vec<&str> = el.align.map(|a| a.as_str()).into_iter().chain(valign).collect();
    if terms.is_empty() {
        return content;
    }

    let trimmed = content.trim();
    let inner = if trimmed.starts_with('[') || trimmed.starts_with('#') {
        content
    } else {
        format!("#{}", content)
    };
    format!("align({})[{}]", terms.join(" + "), inner)
}

/// Content argument of a placement call
///
/// A bare balanced call such as `Fig(..)` is passed as code; anything else
/// is wrapped in a content block.
fn placement_arg(content: &str) -> String {
    let s = content.trim_start();
    let bare_call = !s.is_empty()
        && !s.starts_with('#')
        && s.contains('(')
        && s.matches('(').count() == s.matches(')').count();
    if bare_call {
        content.to_string()
    } else {
        format!("[{}]", content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegrid_ast::{Grid, HAlign, PageSize, Sides};

    fn page_with(elements: Vec<Element>) -> Document {
        let mut page = Page::new("p", "Intro", PageSize::new(297.0, 210.0), Grid::new(4, 4));
        page.elements = elements;
        let mut doc = Document::new();
        doc.pages.push(page);
        doc
    }

    fn rect_el(id: &str, spec: RectSpec) -> Element {
        Element::new(id, ElementType::Rectangle)
            .with_area(Area::new(1, 1, 2, 2))
            .with_payload(Payload::Rectangle(spec))
    }

    #[test]
    fn test_placement_arg() {
        assert_eq!(placement_arg("ColorRect(\"#fff\", 1.0)"), "ColorRect(\"#fff\", 1.0)");
        assert_eq!(placement_arg("#text[Hi]"), "[#text[Hi]]");
        assert_eq!(placement_arg("\"\""), "[\"\"]");
        assert_eq!(placement_arg("Fig(a) + (b"), "[Fig(a) + (b]");
    }

    #[test]
    fn test_rectangle_forms() {
        let plain = rectangle_call(&RectSpec::default(), &Style::default());
        assert_eq!(plain, "ColorRect(\"#3498db\", 1.0)");

        let stroked = RectSpec {
            color: Some("#ff0000".to_string()),
            alpha: Some(0.45),
            stroke: Some("1pt".to_string()),
            ..Default::default()
        };
        assert_eq!(
            rectangle_call(&stroked, &Style::default()),
            "ColorRect(\"#ff0000\", 0.45, stroke: 1pt, stroke_color: \"#ff0000\")"
        );

        let rounded = RectSpec {
            alpha: Some(2.0),
            radius: Some("3mm".to_string()),
            ..Default::default()
        };
        assert_eq!(
            rectangle_call(&rounded, &Style::default()),
            "ColorRect(\"#3498db\", 1.0, stroke: none, stroke_color: none, radius: \"3mm\")"
        );
    }

    #[test]
    fn test_rectangle_style_fallback() {
        let style = Style {
            color: Some("#222222".to_string()),
            alpha: Some("half".to_string()),
            stroke: Some("2pt".to_string()),
            stroke_color: Some("#000000".to_string()),
            radius: Some("1mm".to_string()),
            ..Default::default()
        };
        let own = RectSpec {
            alpha: Some(-0.5),
            ..Default::default()
        };
        assert_eq!(
            rectangle_call(&own, &style),
            "ColorRect(\"#222222\", 0.0, stroke: \"2pt\", stroke_color: \"#000000\", radius: \"1mm\")"
        );
        assert!(rectangle_call(&RectSpec::default(), &style).starts_with("ColorRect(\"#222222\", 1.0,"));
    }

    #[test]
    fn test_alignment_wrapper() {
        let mut el = Element::new("a", ElementType::Body);
        assert_eq!(wrap_alignment(&el, "#text[x]".to_string()), "#text[x]");

        el.align = Some(HAlign::Center);
        el.valign = Some(VAlign::Middle);
        assert_eq!(
            wrap_alignment(&el, "Fig(x)".to_string()),
            "align(center + horizon)[#Fig(x)]"
        );

        el.align = None;
        el.valign = None;
        el.flow = Some(Flow::BottomUp);
        assert_eq!(wrap_alignment(&el, "[a]".to_string()), "align(bottom)[[a]]");
    }

    #[test]
    fn test_emits_page_frame() {
        let doc = page_with(vec![rect_el("r", RectSpec::default())]);
        let out = emit(&doc);
        assert!(out.source.contains("// Page 1: Intro\n#let cw = 297mm / 4\n#let ch = 210mm / 4\n"));
        assert!(out.source.contains("lc: 0, rc: 0, lr: 0, br: 0, cc: 4, cr: 4, lm: 0mm"));
        assert!(out.source.contains("// Element r (rectangle)\n#layer_grid(gp,1,1,2,2, ColorRect(\"#3498db\", 1.0))\n"));
        assert!(out.source.trim_end().ends_with("// END PAGE CONTENT"));
        assert!(!out.source.contains("#pagebreak()"));
    }

    #[test]
    fn test_margins_and_padding() {
        let mut el = rect_el("r", RectSpec::default());
        el.padding_mm = Some(Sides::new(1.0, 2.5, 0.0, 4.0));
        let mut doc = page_with(vec![el]);
        doc.pages[0] = doc.pages[0].clone().with_margins(Sides::new(10.0, 15.0, 10.0, 25.0));
        let out = emit(&doc);
        assert!(out.source.contains("#let cw = (297mm - (25.0mm + 15.0mm)) / 4\n"));
        assert!(out.source.contains("lc: 1, rc: 1, lr: 1, br: 1, cc: 4, cr: 4, lm: 25.0mm, rm: 15.0mm, tm: 10.0mm, bm: 10.0mm"));
        assert!(out.source.contains("#layer_grid_padded(gp,1,1,2,2, 1.0mm, 2.5mm, 0.0mm, 4.0mm, ColorRect("));
    }

    #[test]
    fn test_out_of_bounds_warns_once() {
        let el = rect_el("wide", RectSpec::default()).with_area(Area::new(3, 1, 4, 1));
        let mut twin = el.clone();
        twin.z = 200;
        let doc = page_with(vec![el, twin]);
        let out = emit(&doc);
        assert_eq!(
            out.warnings,
            vec!["AREA out-of-bounds for element wide on page Intro: (3,1,4,1)"]
        );
    }

    #[test]
    fn test_z_order_is_stable() {
        let mut low = rect_el("low", RectSpec::default());
        low.z = 5;
        let doc = page_with(vec![
            rect_el("first", RectSpec::default()),
            low,
            rect_el("second", RectSpec::default()),
        ]);
        let src = emit(&doc).source;
        let pos = |id: &str| src.find(&format!("// Element {} ", id)).unwrap();
        assert!(pos("low") < pos("first"));
        assert!(pos("first") < pos("second"));
    }

    #[test]
    fn test_unrendered_elements_are_skipped() {
        let doc = page_with(vec![
            Element::new("ghost", ElementType::Unknown("chart".to_string())),
            Element::new("spacer", ElementType::None),
        ]);
        let src = emit(&doc).source;
        assert!(!src.contains("// Element ghost"));
        assert!(!src.contains("// Element spacer"));
    }

    #[test]
    fn test_explicit_pdf_scale_and_image_fallback() {
        let pdf = PdfRef {
            src: Some("deck.pdf".to_string()),
            page: 2,
            scale: Some(0.5),
            ..Default::default()
        };
        let (comment, call) = embed_pdf("deck.pdf", &pdf, || unreachable!());
        assert!(comment.is_none());
        assert_eq!(call, "PdfEmbed(\"deck.pdf\", page: 2, scale: 0.5)");

        let (comment, call) = embed_pdf("chart.png", &pdf, || 1.0);
        assert!(comment.is_none());
        assert!(call.starts_with("Fig(image(\"chart.png\""));
    }

    #[test]
    fn test_svg_scale() {
        let contained = SvgRef {
            src: Some("logo.svg".to_string()),
            scale: None,
        };
        assert_eq!(
            svg_image(&contained).unwrap(),
            "Fig(image(\"logo.svg\", width: 100%, height: 100%, fit: \"contain\"))"
        );

        let scaled = SvgRef {
            scale: Some(0.5),
            ..contained.clone()
        };
        assert_eq!(
            svg_image(&scaled).unwrap(),
            "Fig(image(\"logo.svg\", width: 50.0%))"
        );

        let zero = SvgRef {
            scale: Some(0.0),
            ..contained.clone()
        };
        assert_eq!(svg_image(&zero), svg_image(&contained));
        assert_eq!(svg_image(&SvgRef::default()), None);
    }

    #[test]
    fn test_figure_fit_and_caption() {
        let el = Element::new("f", ElementType::Figure);
        let fig = FigureRef {
            src: Some("a.png".to_string()),
            caption: Some("A \"quoted\" one".to_string()),
            fit: "Fill".to_string(),
        };
        assert_eq!(
            figure(&el, &fig).unwrap(),
            "Fig(image(\"a.png\", width: 100%, height: 100%, fit: \"cover\"), caption: [A \\\"quoted\\\" one], caption_align: left, img_align: left)"
        );
    }

    #[test]
    fn test_toc_skips_ignored_pages_but_counts_them() {
        let mut doc = page_with(vec![Element::new("toc", ElementType::Toc)]);
        let mut second = Page::new("q", "Skipped", PageSize::new(297.0, 210.0), Grid::new(4, 4));
        second.props.insert("TOC_IGNORE".to_string(), "yes".to_string());
        doc.pages.push(second);
        doc.pages.push(Page::new("r", "Last", PageSize::new(297.0, 210.0), Grid::new(4, 4)));

        let src = emit(&doc).source;
        assert!(src.contains("[#text(font: \"Inter\")[Intro]]"));
        assert!(!src.contains("[#text(font: \"Inter\")[Skipped]]"));
        assert!(src.contains("[#text(font: \"Inter\")[Last]], [#align(center)[#text(font: \"Inter\")[#repeat[.]]]], [#text(font: \"Inter\")[3]])"));
        assert_eq!(src.matches("#pagebreak()").count(), 2);
    }
}
