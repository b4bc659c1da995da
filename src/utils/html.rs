// src/utils/html.rs

/// Strips unsafe markup from admin-authored rich text (topic names and
/// descriptions, question content and explanations) before it is stored.
///
/// Whitelist based: harmless tags such as `<b>` or `<sub>` survive, which
/// matters for formulas like `x<sup>2</sup>`; `<script>`, `<iframe>` and event
/// handler attributes are removed together with script bodies.
pub fn sanitize(input: &str) -> String {
    ammonia::clean(input)
}
