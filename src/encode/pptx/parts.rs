//! XML part templates for the presentation package.
//!
//! Every function returns a complete part body. Anything caller-supplied is
//! escaped with `quick_xml::escape::escape`.

use super::SlideSize;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use std::fmt::Write;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Relationship type URIs.
pub mod rel_type {
    /// Package root to the main presentation part
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    /// Package root to core properties
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    /// Package root to extended properties
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    /// Presentation to slide master
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    /// Presentation to slide
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    /// Slide or master to layout
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    /// Slide to embedded image
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    /// Master or presentation to theme
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    /// Presentation to presentation properties
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    /// Presentation to view properties
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    /// Presentation to table styles
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
}

/// Content types for overrides.
mod content_type {
    pub const PRESENTATION: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
    pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
    pub const SLIDE_MASTER: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
    pub const SLIDE_LAYOUT: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const PRES_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml";
    pub const VIEW_PROPS: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml";
    pub const TABLE_STYLES: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml";
    pub const CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
    pub const APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// One `<Relationship>` entry.
pub(crate) struct Rel<'a> {
    pub id: String,
    pub rel_type: &'a str,
    pub target: String,
}

impl<'a> Rel<'a> {
    pub(crate) fn new(id: impl Into<String>, rel_type: &'a str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rel_type,
            target: target.into(),
        }
    }
}

/// A `.rels` part body.
pub(crate) fn relationships(rels: &[Rel<'_>]) -> String {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        let _ = write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id,
            rel.rel_type,
            escape(rel.target.as_str())
        );
    }
    xml.push_str("</Relationships>");
    xml
}

/// `[Content_Types].xml` for a deck of `slide_count` slides.
pub(crate) fn content_types(slide_count: usize) -> String {
    let mut xml = String::with_capacity(2048 + slide_count * 140);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(
        r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    );
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Default Extension="png" ContentType="image/png"/>"#);

    let mut override_part = |name: &str, ct: &str| {
        let _ = write!(xml, r#"<Override PartName="{}" ContentType="{}"/>"#, name, ct);
    };
    override_part("/ppt/presentation.xml", content_type::PRESENTATION);
    for n in 1..=slide_count {
        override_part(&format!("/ppt/slides/slide{}.xml", n), content_type::SLIDE);
    }
    override_part("/ppt/slideMasters/slideMaster1.xml", content_type::SLIDE_MASTER);
    override_part("/ppt/slideLayouts/slideLayout1.xml", content_type::SLIDE_LAYOUT);
    override_part("/ppt/theme/theme1.xml", content_type::THEME);
    override_part("/ppt/presProps.xml", content_type::PRES_PROPS);
    override_part("/ppt/viewProps.xml", content_type::VIEW_PROPS);
    override_part("/ppt/tableStyles.xml", content_type::TABLE_STYLES);
    override_part("/docProps/core.xml", content_type::CORE);
    override_part("/docProps/app.xml", content_type::APP);

    xml.push_str("</Types>");
    xml
}

/// `ppt/presentation.xml`.
///
/// `slide_rel_ids` are in slide order; slide ids start at 256.
pub(crate) fn presentation(size: SlideSize, slide_rel_ids: &[String]) -> String {
    let mut xml = String::with_capacity(1024 + slide_rel_ids.len() * 40);
    xml.push_str(XML_DECL);
    let _ = write!(
        xml,
        r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
        NS_A, NS_R, NS_P
    );
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);

    if !slide_rel_ids.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for (i, rel_id) in slide_rel_ids.iter().enumerate() {
            let _ = write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, super::FIRST_SLIDE_ID + i as u32, rel_id);
        }
        xml.push_str("</p:sldIdLst>");
    }

    let _ = write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/>"#,
        size.cx, size.cy
    );
    xml.push_str("</p:presentation>");
    xml
}

/// `ppt/slides/slideN.xml`: one picture covering the whole slide.
pub(crate) fn slide(number: usize, title: &str, size: SlideSize) -> String {
    let mut xml = String::with_capacity(1200);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#, NS_A, NS_R, NS_P);
    xml.push_str("<p:cSld><p:spTree>");
    push_group_properties(&mut xml);

    xml.push_str("<p:pic><p:nvPicPr>");
    let _ = write!(
        xml,
        r#"<p:cNvPr id="2" name="Slide Image {}" descr="{}"/>"#,
        number,
        xml_text(title)
    );
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#);
    xml.push_str(r#"<p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#);
    let _ = write!(
        xml,
        r#"<p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{}" cy="{}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
        size.cx, size.cy
    );
    xml.push_str("</p:pic>");

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
    xml.push_str("</p:sld>");
    xml
}

fn push_group_properties(xml: &mut String) {
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(
        r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
    );
}

/// `ppt/slideMasters/slideMaster1.xml`.
pub(crate) fn slide_master() -> String {
    let mut xml = String::with_capacity(1400);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<p:sldMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#, NS_A, NS_R, NS_P);
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    push_group_properties(&mut xml);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(
        r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
    );
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str(
        r#"<p:txStyles><p:titleStyle><a:lvl1pPr><a:defRPr sz="4400"/></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr><a:defRPr sz="3200"/></a:lvl1pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:otherStyle></p:txStyles>"#,
    );
    xml.push_str("</p:sldMaster>");
    xml
}

/// `ppt/slideLayouts/slideLayout1.xml`: a blank layout.
pub(crate) fn slide_layout() -> String {
    let mut xml = String::with_capacity(900);
    xml.push_str(XML_DECL);
    let _ = write!(
        xml,
        r#"<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="blank" preserve="1">"#,
        NS_A, NS_R, NS_P
    );
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree>"#);
    push_group_properties(&mut xml);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
    xml.push_str("</p:sldLayout>");
    xml
}

/// `ppt/theme/theme1.xml`: the Office colour, font and format schemes.
pub(crate) fn theme() -> String {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    let _ = write!(xml, r#"<a:theme xmlns:a="{}" name="Office Theme">"#, NS_A);
    xml.push_str("<a:themeElements>");

    xml.push_str(r#"<a:clrScheme name="Office">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    for (name, rgb) in [
        ("dk2", "44546A"),
        ("lt2", "E7E6E6"),
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ] {
        let _ = write!(xml, r#"<a:{0}><a:srgbClr val="{1}"/></a:{0}>"#, name, rgb);
    }
    xml.push_str("</a:clrScheme>");

    xml.push_str(r#"<a:fontScheme name="Office">"#);
    for (kind, face) in [("majorFont", "Calibri Light"), ("minorFont", "Calibri")] {
        let _ = write!(
            xml,
            r#"<a:{0}><a:latin typeface="{1}"/><a:ea typeface=""/><a:cs typeface=""/></a:{0}>"#,
            kind, face
        );
    }
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="Office">"#);
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        let _ = write!(
            xml,
            r#"<a:ln w="{}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            width
        );
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements>");
    xml.push_str("<a:objectDefaults/><a:extraClrSchemeLst/>");
    xml.push_str("</a:theme>");
    xml
}

/// `ppt/presProps.xml`.
pub(crate) fn presentation_properties() -> String {
    format!(
        r#"{}<p:presentationPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"/>"#,
        XML_DECL, NS_A, NS_R, NS_P
    )
}

/// `ppt/viewProps.xml`.
pub(crate) fn view_properties() -> String {
    format!(
        r#"{}<p:viewPr xmlns:a="{}" xmlns:r="{}" xmlns:p="{}"><p:normalViewPr><p:restoredLeft sz="15620"/><p:restoredTop sz="94660"/></p:normalViewPr><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        XML_DECL, NS_A, NS_R, NS_P
    )
}

/// `ppt/tableStyles.xml`.
pub(crate) fn table_styles() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="{}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECL, NS_A
    )
}

/// Escape user text, dropping characters XML 1.0 does not allow.
fn xml_text(text: &str) -> String {
    let allowed: String = text
        .chars()
        .filter(|&c| {
            (!c.is_control() || matches!(c, '\t' | '\n' | '\r'))
                && !matches!(c, '\u{FFFE}' | '\u{FFFF}')
        })
        .collect();
    escape(allowed.as_str()).into_owned()
}

/// `docProps/core.xml`.
pub(crate) fn core_properties(title: &str, created: DateTime<Utc>) -> String {
    let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut xml = String::with_capacity(800);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    );
    let _ = write!(xml, "<dc:title>{}</dc:title>", xml_text(title));
    xml.push_str("<dc:creator>deckport</dc:creator>");
    let _ = write!(
        xml,
        r#"<dcterms:created xsi:type="dcterms:W3CDTF">{0}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{0}</dcterms:modified>"#,
        stamp
    );
    xml.push_str("</cp:coreProperties>");
    xml
}

/// `docProps/app.xml`.
pub(crate) fn app_properties(slide_count: usize) -> String {
    format!(
        r#"{}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>deckport</Application><PresentationFormat>Custom</PresentationFormat><Slides>{}</Slides><AppVersion>{}</AppVersion></Properties>"#,
        XML_DECL,
        slide_count,
        env!("CARGO_PKG_VERSION")
    )
}
