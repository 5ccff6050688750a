use quick_xml::events::Event;
use quick_xml::Reader;

#[derive(Clone, Copy)]
enum Capture {
    Title,
    Text,
}

/// Find the `<page>` whose `<title>` equals `label` exactly and return its
/// `<revision><text>` content.
///
/// A block is a run of sibling `<page>` records, so it is wrapped in a
/// synthetic root first. Malformed or truncated XML, a missing page and an
/// empty text body all come back as `None`; pages that parsed before the
/// damage are still considered.
pub fn select_document(block: &[u8], label: &str) -> Option<String> {
    let wrapped = format!("<root>{}</root>", String::from_utf8_lossy(block));
    let mut reader = Reader::from_str(&wrapped);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut capture: Option<Capture> = None;
    let mut title = String::new();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                capture = match name.as_slice() {
                    b"title" if path.last().map(Vec::as_slice) == Some(&b"page"[..]) => Some(Capture::Title),
                    b"text" if path.ends_with(&[b"page".to_vec(), b"revision".to_vec()]) => Some(Capture::Text),
                    _ => None,
                };
                if name == b"page" {
                    title.clear();
                    text.clear();
                }
                path.push(name);
            }
            Ok(Event::End(e)) => {
                path.pop();
                capture = None;
                if e.name().as_ref() == b"page" && title == label && !text.is_empty() {
                    return Some(std::mem::take(&mut text));
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(target) = capture {
                    let Ok(s) = t.unescape() else { return None };
                    match target {
                        Capture::Title => title.push_str(&s),
                        Capture::Text => text.push_str(&s),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(target) = capture {
                    let s = String::from_utf8_lossy(&c);
                    match target {
                        Capture::Title => title.push_str(&s),
                        Capture::Text => text.push_str(&s),
                    }
                }
            }
            Ok(Event::Eof) => return None,
            Err(e) => {
                tracing::debug!(label, error = %e, "page block did not parse");
                return None;
            }
            Ok(_) => {}
        }
    }
}
