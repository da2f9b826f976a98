use std::cell::RefCell;
use std::str;

thread_local! {
    /// Reused by every `to_string` on this thread, so repeated parses don't grow a fresh buffer.
    static DECODE_BUFFER: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Character sets a [`ByteView`](super::ByteView) can be decoded with.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    #[default]
    Utf8,
    /// 7-bit US-ASCII, any byte with the high bit set is undecodable
    Ascii,
    /// ISO-8859-1, every byte maps to the char with the same code point
    Latin1,
}

#[derive(Debug)]
pub(crate) struct Undecodable;

impl Charset {
    /// Looks a charset up by its IANA label, e.g. the `charset` parameter of a content type.
    pub fn from_label(label: &str) -> Option<Charset> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("utf-8") || label.eq_ignore_ascii_case("utf8") {
            Some(Charset::Utf8)
        } else if label.eq_ignore_ascii_case("us-ascii") || label.eq_ignore_ascii_case("ascii") {
            Some(Charset::Ascii)
        } else if label.eq_ignore_ascii_case("iso-8859-1") || label.eq_ignore_ascii_case("latin1") {
            Some(Charset::Latin1)
        } else {
            None
        }
    }

    /// Decodes `segments` as one byte sequence through the thread's reusable buffer.
    pub(crate) fn decode<'a, I>(self, segments: I) -> Result<String, Undecodable>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        DECODE_BUFFER.with_borrow_mut(|buf| {
            buf.clear();
            self.decode_into(segments, buf)?;
            Ok(buf.as_str().to_owned())
        })
    }

    fn decode_into<'a, I>(self, segments: I, out: &mut String) -> Result<(), Undecodable>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        match self {
            Charset::Utf8 => decode_utf8(segments, out),
            Charset::Ascii => {
                for segment in segments {
                    if !segment.is_ascii() {
                        return Err(Undecodable);
                    }
                    out.extend(segment.iter().copied().map(char::from));
                }
                Ok(())
            }
            Charset::Latin1 => {
                for segment in segments {
                    out.extend(segment.iter().copied().map(char::from));
                }
                Ok(())
            }
        }
    }
}

/// Decodes UTF-8 that may be split anywhere between segments, including inside a char.
fn decode_utf8<'a, I>(segments: I, out: &mut String) -> Result<(), Undecodable>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    // bytes of a char cut off by the end of the previous segment
    let mut partial = [0u8; 4];
    let mut partial_len = 0;

    for segment in segments {
        let mut rest = segment;

        while partial_len > 0 {
            let Some((&byte, tail)) = rest.split_first() else { break };
            partial[partial_len] = byte;
            partial_len += 1;
            rest = tail;

            match str::from_utf8(&partial[..partial_len]) {
                Ok(ch) => {
                    out.push_str(ch);
                    partial_len = 0;
                }
                Err(e) if e.error_len().is_none() && partial_len < 4 => {}
                Err(_) => return Err(Undecodable),
            }
        }

        match str::from_utf8(rest) {
            Ok(s) => out.push_str(s),
            Err(e) => {
                let valid = e.valid_up_to();
                if e.error_len().is_some() {
                    return Err(Undecodable);
                }
                // only an incomplete char at the very end, finish it with the next segment
                if let Ok(s) = str::from_utf8(&rest[..valid]) {
                    out.push_str(s);
                }
                let cut = &rest[valid..];
                partial[..cut.len()].copy_from_slice(cut);
                partial_len = cut.len();
            }
        }
    }

    if partial_len > 0 {
        return Err(Undecodable);
    }
    Ok(())
}
