//! Shared SSE frame draining, generalized from the teacher's per-provider
//! `drain_sse_frames`/`handle_sse_frame` pair (`agent/provider_glm.rs`).
//!
//! Frames are separated by a blank line (`\n\n` or `\r\n\r\n`); each frame may
//! hold several `data: ...` lines. This only strips framing and the
//! `data: `/`[DONE]` convention — the JSON payload shape differs per
//! provider, so callers parse the returned strings themselves and are
//! expected to silently skip ones that fail to parse (keepalives, comments).

/// Drain every complete frame currently buffered in `pending`, returning the
/// `data: ` payload of each non-empty, non-`[DONE]` line found. Leaves any
/// trailing partial frame in `pending` for the next chunk.
pub fn drain_frames(pending: &mut String) -> Vec<String> {
    let mut out = Vec::new();
    loop {
        let boundary = pending
            .find("\n\n")
            .map(|pos| (pos, pos + 2))
            .or_else(|| pending.find("\r\n\r\n").map(|pos| (pos, pos + 4)));

        let Some((frame_end, consume_end)) = boundary else {
            break;
        };

        let frame = pending[..frame_end].to_string();
        pending.drain(..consume_end);

        for raw_line in frame.lines() {
            let line = raw_line.trim_end_matches('\r');
            let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            out.push(data.to_string());
        }
    }
    out
}
