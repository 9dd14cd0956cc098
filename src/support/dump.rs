//! Debug dumping of JSON values: collapsible HTML and ANSI terminal output.

use std::fmt::Write as _;
use std::panic::Location;

use serde_json::Value;

use crate::core::Response;

/// Nesting level past which values are elided.
pub const MAX_DEPTH: usize = 10;

/// Number of keys shown in a collapsed container's summary.
const PREVIEW_KEYS: usize = 3;

const PAGE_HEAD: &str = r#"<!DOCTYPE html><html><head><meta charset="UTF-8"><title>Debug Dump</title>
<style>
body{font-family:monospace;background:#2d2d2d;color:#f8f8f2;padding:20px}
.dd-container{margin-bottom:20px;border:1px solid #444;border-radius:4px;overflow:hidden}
.dd-header{background:#444;color:#f8f8f2;padding:8px 15px;font-weight:bold;display:flex;justify-content:space-between;align-items:center}
.dd-controls button{margin-left:5px;background:#333;color:#f8f8f2;border:none;padding:4px 8px;border-radius:4px;cursor:pointer}
.dd-controls button:hover{background:#555}
.dd-content{padding:15px;overflow:auto;max-height:500px}
.dump{white-space:pre;font-family:monospace}
.string{color:#a6e22e}.number{color:#ae81ff}.boolean{color:#66d9ef}.null{color:#f92672}
.array{color:#fd971f}.object{color:#a1efe4}.property{color:#e6db74}
.collapsible{cursor:pointer}.collapsed>.collapse-content{display:none}
.collapse-toggle:before{content:"+"}.expanded>.collapse-toggle:before{content:"-"}
.search-container{margin-bottom:10px;display:flex;gap:5px}
.search-form{display:flex;flex-grow:1;gap:5px}
.search-input{flex-grow:1;background:#333;color:#f8f8f2;border:1px solid #444;padding:6px;border-radius:4px}
.search-btn{background:#444;color:#f8f8f2;border:none;padding:6px 10px;border-radius:4px;cursor:pointer}
.search-btn:hover{background:#555}
.highlight-search{background-color:#ff8;color:#000}
</style>
<script>
document.addEventListener("DOMContentLoaded",function(){
  document.querySelectorAll(".collapse-toggle").forEach(function(t){
    t.addEventListener("click",function(){
      var p=this.closest(".collapsible");
      p.classList.toggle("expanded");p.classList.toggle("collapsed");
    });
  });
  document.querySelectorAll(".expand-all,.collapse-all").forEach(function(b){
    b.addEventListener("click",function(){
      var open=this.classList.contains("expand-all");
      this.closest(".dd-container").querySelectorAll(".collapsible").forEach(function(e){
        e.classList.toggle("expanded",open);e.classList.toggle("collapsed",!open);
      });
    });
  });
  document.querySelectorAll(".search-form").forEach(function(form){
    form.addEventListener("submit",function(ev){
      ev.preventDefault();
      var box=this.closest(".dd-container");
      var term=this.querySelector(".search-input").value.toLowerCase();
      box.querySelectorAll(".highlight-search").forEach(function(el){
        el.replaceWith(document.createTextNode(el.textContent));
      });
      box.querySelector(".dd-content").normalize();
      if(!term) return;
      var walker=document.createTreeWalker(box.querySelector(".dd-content"),NodeFilter.SHOW_TEXT);
      var nodes=[];
      while(walker.nextNode()) nodes.push(walker.currentNode);
      nodes.forEach(function(node){
        var text=node.textContent,lower=text.toLowerCase(),at=lower.indexOf(term);
        if(at<0) return;
        var frag=document.createDocumentFragment(),from=0;
        while(at>=0){
          frag.appendChild(document.createTextNode(text.slice(from,at)));
          var mark=document.createElement("span");
          mark.className="highlight-search";
          mark.textContent=text.slice(at,at+term.length);
          frag.appendChild(mark);
          from=at+term.length;
          at=lower.indexOf(term,from);
        }
        frag.appendChild(document.createTextNode(text.slice(from)));
        node.replaceWith(frag);
      });
    });
  });
});
</script>
</head><body><h1 style="color:#f92672;">Debug Dump</h1>"#;

/// Short human-readable type tag, e.g. `array:3` or `string:5`.
pub fn type_label(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Array(items) => format!("array:{}", items.len()),
        Value::Object(map) => format!("object:{}", map.len()),
        Value::Bool(b) => format!("boolean:{}", b),
        Value::String(s) => format!("string:{}", s.len()),
        Value::Number(n) if n.is_f64() => "float".to_string(),
        Value::Number(_) => "int".to_string(),
    }
}

/// Render a value as nested, collapsible HTML spans.
pub fn format_html(value: &Value) -> String {
    let mut out = String::new();
    write_html(&mut out, value, 0);
    out
}

fn write_html(out: &mut String, value: &Value, depth: usize) {
    if depth > MAX_DEPTH {
        out.push_str(r#"<span class="null">*MAX DEPTH*</span>"#);
        return;
    }

    match value {
        Value::Null => out.push_str(r#"<span class="null">null</span>"#),
        Value::Bool(b) => {
            let _ = write!(out, r#"<span class="boolean">{}</span>"#, b);
        }
        Value::Number(n) => {
            let _ = write!(out, r#"<span class="number">{}</span>"#, n);
        }
        Value::String(s) => {
            let _ = write!(out, r#"<span class="string">"{}"</span>"#, escape_html(s));
        }
        Value::Array(items) => {
            let keys: Vec<String> = (0..items.len()).map(|i| i.to_string()).collect();
            open_container(out, "array", &format!("array:{}", items.len()), '[', &keys);
            for (i, item) in items.iter().enumerate() {
                write_entry(out, &i.to_string(), item, depth);
            }
            out.push_str("</span>]</span>");
        }
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().map(|k| format!("\"{}\"", escape_html(k))).collect();
            open_container(out, "object", &format!("object:{}", map.len()), '{', &keys);
            for (key, item) in map {
                write_entry(out, key, item, depth);
            }
            out.push_str("</span>}</span>");
        }
    }
}

fn open_container(out: &mut String, class: &str, label: &str, open: char, keys: &[String]) {
    let mut preview = keys
        .iter()
        .take(PREVIEW_KEYS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if keys.len() > PREVIEW_KEYS {
        preview.push_str(", ...");
    }

    let _ = write!(
        out,
        r#"<span class="collapsible expanded"><span class="collapse-toggle"></span><span class="{}">{} {}{}</span><span class="collapse-content">"#,
        class, label, open, preview
    );
}

fn write_entry(out: &mut String, key: &str, value: &Value, depth: usize) {
    out.push('\n');
    out.push_str(&"  ".repeat(depth + 1));
    let _ = write!(out, r#"<span class="property">{}</span> => "#, escape_html(key));
    write_html(out, value, depth + 1);
}

/// Complete debug page for `values`, labelled with the caller location.
#[track_caller]
pub fn dd(values: &[Value]) -> Response {
    let caller = Location::caller();
    Response::html(render_page(values, caller.file(), caller.line()))
}

/// Build the HTML debug page.
pub fn render_page(values: &[Value], file: &str, line: u32) -> String {
    let origin = escape_html(&format!("{}:{}", file, line));
    let mut page = String::from(PAGE_HEAD);

    for (i, value) in values.iter().enumerate() {
        let _ = write!(
            page,
            "<div class='dd-container'><div class='dd-header'><span>Variable #{} ({}) - {}</span>\
             <div class='dd-controls'><button class='expand-all'>Expand All</button>\
             <button class='collapse-all'>Collapse All</button></div></div>\
             <div class='search-container'><form class='search-form'>\
             <input type='text' class='search-input' placeholder='Search...'>\
             <button type='submit' class='search-btn'>Search</button></form></div>\
             <div class='dd-content'><div class='dump'>{}</div></div></div>",
            i + 1,
            type_label(value),
            origin,
            format_html(value)
        );
    }

    page.push_str("</body></html>");
    page
}

/// Terminal rendering with ANSI-coloured headers.
#[track_caller]
pub fn dump_cli(values: &[Value]) -> String {
    let caller = Location::caller();
    render_cli(values, caller.file(), caller.line())
}

pub fn render_cli(values: &[Value], file: &str, line: u32) -> String {
    let mut out = String::new();
    for (i, value) in values.iter().enumerate() {
        let body = serde_json::to_string_pretty(value).unwrap_or_default();
        let _ = write!(
            out,
            "\n\x1b[1;36mVariable #{} ({})\x1b[0m\n{}\n\x1b[0;90mCalled from: {}:{}\x1b[0m\n",
            i + 1,
            type_label(value),
            body,
            file,
            line
        );
    }
    out
}

/// Print values to stderr in terminal format.
#[track_caller]
pub fn dump(values: &[Value]) {
    eprint!("{}", dump_cli(values));
}

/// Escape `& < > " '` for HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}
