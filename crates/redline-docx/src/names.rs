//! WordprocessingML element and attribute names.
//!
//! Word always writes the main namespace with the `w:` prefix; the tree keeps
//! qualified names as written, so matching is by prefixed name.

pub const DOCUMENT: &str = "w:document";
pub const BODY: &str = "w:body";
pub const P: &str = "w:p";
pub const PPR: &str = "w:pPr";
pub const PSTYLE: &str = "w:pStyle";
pub const OUTLINE_LVL: &str = "w:outlineLvl";
pub const SECT_PR: &str = "w:sectPr";
pub const R: &str = "w:r";
pub const RPR: &str = "w:rPr";
pub const T: &str = "w:t";
pub const DEL_TEXT: &str = "w:delText";
pub const INSTR_TEXT: &str = "w:instrText";
pub const DEL_INSTR_TEXT: &str = "w:delInstrText";
pub const TAB: &str = "w:tab";
pub const BR: &str = "w:br";
pub const CR: &str = "w:cr";
pub const NO_BREAK_HYPHEN: &str = "w:noBreakHyphen";
pub const SOFT_HYPHEN: &str = "w:softHyphen";
pub const LAST_RENDERED_PAGE_BREAK: &str = "w:lastRenderedPageBreak";
pub const DRAWING: &str = "w:drawing";
pub const PICT: &str = "w:pict";
pub const INS: &str = "w:ins";
pub const DEL: &str = "w:del";
pub const MOVE_FROM: &str = "w:moveFrom";
pub const TBL: &str = "w:tbl";
pub const TR: &str = "w:tr";
pub const TC: &str = "w:tc";
pub const SDT: &str = "w:sdt";
pub const SDT_CONTENT: &str = "w:sdtContent";
pub const COMMENTS: &str = "w:comments";
pub const COMMENT: &str = "w:comment";
pub const COMMENT_RANGE_START: &str = "w:commentRangeStart";
pub const COMMENT_RANGE_END: &str = "w:commentRangeEnd";
pub const COMMENT_REFERENCE: &str = "w:commentReference";

pub const A_VAL: &str = "w:val";
pub const A_TYPE: &str = "w:type";
pub const A_ID: &str = "w:id";
pub const A_AUTHOR: &str = "w:author";
pub const A_DATE: &str = "w:date";
pub const A_INITIALS: &str = "w:initials";
pub const XML_SPACE: &str = "xml:space";

pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";

pub const CT_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const CT_COMMENTS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";
pub const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";

pub const PART_DOCUMENT: &str = "word/document.xml";
pub const PART_DOCUMENT_RELS: &str = "word/_rels/document.xml.rels";
pub const PART_COMMENTS: &str = "word/comments.xml";
pub const PART_CONTENT_TYPES: &str = "[Content_Types].xml";
pub const PART_ROOT_RELS: &str = "_rels/.rels";
