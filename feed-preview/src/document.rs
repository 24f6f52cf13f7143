use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::models::PreviewError;

/// 元素的子节点
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// 简化的 XML 元素：限定名（如 `content:encoded`）、属性和子节点
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

        // 属性解析失败时跳过该属性
        let attributes = start
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let value = unescape_lenient(&String::from_utf8_lossy(&attr.value));
                (key, value)
            })
            .collect();

        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// 所有后代文本节点按文档顺序拼接
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// 按文档顺序查找所有同名后代（不含自身）
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect_descendants(name, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if let Node::Element(element) = child {
                if element.name == name {
                    found.push(element);
                }
                element.collect_descendants(name, found);
            }
        }
    }

    /// 文档顺序中第一个同名后代
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| match child {
            Node::Element(element) if element.name == name => Some(element),
            Node::Element(element) => element.find(name),
            Node::Text(_) => None,
        })
    }

    /// 第一个同名后代的文本，去掉首尾空白；不存在时为空串
    pub fn child_text(&self, name: &str) -> String {
        self.find(name)
            .map(|e| e.text_content().trim().to_string())
            .unwrap_or_default()
    }
}

/// 解析 XML 文本，返回挂着顶层节点的虚拟根元素
///
/// 未定义的实体（如 `&nbsp;`）保留原文；结构错误（结束标签不匹配、
/// 元素未闭合）返回错误。
pub fn parse_document(xml: &str) -> Result<Element, PreviewError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)),
            Event::Empty(start) => append(&mut stack, Node::Element(Element::from_start(&start))),
            Event::End(_) => {
                // 结束标签名由 reader 校验，这里只需要出栈
                if stack.len() < 2 {
                    return Err(PreviewError::Unbalanced);
                }
                if let Some(element) = stack.pop() {
                    append(&mut stack, Node::Element(element));
                }
            }
            Event::Text(text) => {
                let content = unescape_lenient(&String::from_utf8_lossy(&text));
                append(&mut stack, Node::Text(content));
            }
            Event::CData(cdata) => {
                let content = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                append(&mut stack, Node::Text(content));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(PreviewError::Unclosed(open));
    }
    Ok(stack.pop().unwrap_or_default())
}

/// 逐个解析实体引用：预定义实体和数字引用被替换，无法识别的引用原样保留
fn unescape_lenient(raw: &str) -> String {
    if let Ok(text) = unescape(raw) {
        return text.into_owned();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        // 引用在下一个 `&` 之前以 `;` 结束，否则 `&` 只是普通字符
        match tail[1..].find([';', '&']) {
            Some(offset) if tail.as_bytes()[offset + 1] == b';' => {
                let reference = &tail[..offset + 2];
                match unescape(reference) {
                    Ok(text) => out.push_str(&text),
                    Err(_) => out.push_str(reference),
                }
                rest = &tail[offset + 2..];
            }
            Some(offset) => {
                out.push_str(&tail[..offset + 1]);
                rest = &tail[offset + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn append(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}
