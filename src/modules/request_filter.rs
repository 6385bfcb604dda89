// Page-side request filtering - no Tauri imports.
//
// The webview does not hand external subresource requests to the shell, so
// the page is given a script, run before any of its own, that routes fetch,
// XHR, beacons and src/href assignments through `check_request` and drops
// whatever the engine blocks.

use crate::modules::navigation::guess_request_type;

/// Command the page script asks for a verdict.
pub const CHECK_COMMAND: &str = "check_request";

// Request types the filter engine understands and the page script sends.
const KNOWN_TYPES: &[&str] = &[
    "script",
    "image",
    "stylesheet",
    "font",
    "media",
    "subdocument",
    "xmlhttprequest",
    "ping",
    "other",
];

/// The engine's request type for `url`. A type supplied by the page wins
/// when it is one the engine knows; otherwise it is guessed from the path.
pub fn resolve_request_type(url: &str, hint: Option<&str>) -> &'static str {
    match hint.and_then(|h| KNOWN_TYPES.iter().copied().find(|t| *t == h)) {
        Some(known) => known,
        None => guess_request_type(url),
    }
}

/// Whether the page should bother asking: only http(s) leaves the machine.
pub fn is_checkable(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Initialization script installed on the main window.
pub fn interceptor_script() -> String {
    INTERCEPTOR_TEMPLATE.replace("__CHECK_COMMAND__", CHECK_COMMAND)
}

const INTERCEPTOR_TEMPLATE: &str = r#"
(function () {
  if (window.__siteShellFilter) return;
  var internals = window.__TAURI_INTERNALS__;
  if (!internals || typeof internals.invoke !== 'function') return;

  var verdicts = new Map();

  function absolute(raw) {
    try { return new URL(String(raw), document.baseURI).href; } catch (e) { return null; }
  }

  // Resolves to true when the request must not be made.
  function blocked(raw, type) {
    var url = absolute(raw);
    if (!url || !/^https?:/.test(url)) return Promise.resolve(false);
    var key = (type || '') + ' ' + url;
    var known = verdicts.get(key);
    if (known) return known;
    var verdict = internals
      .invoke('__CHECK_COMMAND__', { url: url, sourceUrl: location.href, requestType: type })
      .then(function (b) { return b === true; }, function () { return false; });
    verdicts.set(key, verdict);
    return verdict;
  }
  Object.defineProperty(window, '__siteShellFilter', { value: blocked });

  var nativeFetch = window.fetch;
  if (nativeFetch) {
    window.fetch = function (input, init) {
      var self = this, args = arguments;
      var raw = input && typeof input === 'object' && 'url' in input ? input.url : input;
      return blocked(raw, null).then(function (no) {
        if (no) throw new TypeError('Failed to fetch');
        return nativeFetch.apply(self, args);
      });
    };
  }

  var xhrOpen = XMLHttpRequest.prototype.open;
  var xhrSend = XMLHttpRequest.prototype.send;
  XMLHttpRequest.prototype.open = function (method, url, async) {
    this.__siteShellUrl = url;
    this.__siteShellAsync = arguments.length < 3 || async !== false;
    return xhrOpen.apply(this, arguments);
  };
  XMLHttpRequest.prototype.send = function () {
    var xhr = this, args = arguments;
    // Synchronous requests cannot wait for a verdict.
    if (!xhr.__siteShellAsync) return xhrSend.apply(xhr, args);
    blocked(xhr.__siteShellUrl, 'xmlhttprequest').then(function (no) {
      if (!no) return xhrSend.apply(xhr, args);
      xhr.dispatchEvent(new ProgressEvent('error'));
      xhr.dispatchEvent(new ProgressEvent('loadend'));
    });
  };

  if (navigator.sendBeacon) {
    var beacon = navigator.sendBeacon.bind(navigator);
    navigator.sendBeacon = function (url, data) {
      blocked(url, 'ping').then(function (no) { if (!no) beacon(url, data); });
      return true;
    };
  }

  function guard(ctor, prop, type) {
    var proto = ctor && ctor.prototype;
    var desc = proto && Object.getOwnPropertyDescriptor(proto, prop);
    if (!desc || !desc.set) return;
    Object.defineProperty(proto, prop, {
      configurable: true,
      enumerable: desc.enumerable,
      get: desc.get,
      set: function (value) {
        var el = this;
        blocked(value, type).then(function (no) { if (!no) desc.set.call(el, value); });
      }
    });
  }
  guard(window.HTMLScriptElement, 'src', 'script');
  guard(window.HTMLImageElement, 'src', 'image');
  guard(window.HTMLIFrameElement, 'src', 'subdocument');
  guard(window.HTMLLinkElement, 'href', 'stylesheet');
  guard(window.HTMLMediaElement, 'src', 'media');
  guard(window.HTMLSourceElement, 'src', 'media');

  var typesByTag = {
    SCRIPT: 'script', IMG: 'image', IFRAME: 'subdocument', LINK: 'stylesheet',
    VIDEO: 'media', AUDIO: 'media', SOURCE: 'media'
  };
  var setAttribute = Element.prototype.setAttribute;
  Element.prototype.setAttribute = function (name, value) {
    var type = typesByTag[this.tagName];
    var attr = String(name).toLowerCase();
    if (type && (attr === 'src' || (attr === 'href' && this.tagName === 'LINK'))) {
      var el = this;
      blocked(value, type).then(function (no) { if (!no) setAttribute.call(el, name, value); });
      return;
    }
    return setAttribute.apply(this, arguments);
  };
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://ads.example.com/pixel", Some("image"), "image")]
    #[case("https://ads.example.com/frame", Some("subdocument"), "subdocument")]
    #[case("https://cdn.example.com/app.js", None, "script")]
    #[case("https://cdn.example.com/data.json", None, "xmlhttprequest")]
    #[case("https://cdn.example.com/app.js", Some("websocket-ish"), "script")]
    #[case("https://cdn.example.com/collect", None, "other")]
    fn test_resolve_request_type(#[case] url: &str, #[case] hint: Option<&str>, #[case] expected: &str) {
        assert_eq!(resolve_request_type(url, hint), expected);
    }

    #[rstest]
    #[case("https://ads.example.com/a.js", true)]
    #[case("http://ads.example.com/a.js", true)]
    #[case("data:image/png;base64,AAAA", false)]
    #[case("blob:https://www.example.org/1234", false)]
    #[case("tauri://localhost/", false)]
    fn test_is_checkable(#[case] url: &str, #[case] expected: bool) {
        assert_eq!(is_checkable(url), expected);
    }

    #[test]
    fn test_interceptor_script_asks_check_command() {
        let script = interceptor_script();
        assert!(!script.contains("__CHECK_COMMAND__"));
        assert!(script.contains(&format!("invoke('{}'", CHECK_COMMAND)));
    }

    #[rstest]
    #[case("window.fetch = ")]
    #[case("XMLHttpRequest.prototype.send = ")]
    #[case("navigator.sendBeacon = ")]
    #[case("guard(window.HTMLScriptElement, 'src', 'script')")]
    #[case("guard(window.HTMLImageElement, 'src', 'image')")]
    #[case("Element.prototype.setAttribute = ")]
    fn test_interceptor_script_hooks(#[case] hook: &str) {
        assert!(interceptor_script().contains(hook));
    }

    #[test]
    fn test_script_types_are_known_to_engine() {
        let script = interceptor_script();
        for sent in ["'script'", "'image'", "'subdocument'", "'stylesheet'", "'media'", "'xmlhttprequest'", "'ping'"] {
            let bare = sent.trim_matches('\'');
            assert!(script.contains(sent));
            assert_eq!(resolve_request_type("https://x.example/", Some(bare)), bare);
        }
    }
}
