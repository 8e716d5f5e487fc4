// SPDX-License-Identifier: PMPL-1.0-or-later
// Fuzz target for filter compilation: arbitrary JSON through the depth guard
// and the compiler must produce a result or an error, never a panic

#![no_main]

use docjoin_mongo::MongoAdapter;
use docjoin_query::{ensure_max_depth, ParserConfig, Schema};
use libfuzzer_sys::fuzz_target;

const SCHEMA: &str = r#"{
  "lists": [
    {
      "key": "Post",
      "collection": "posts",
      "fields": [
        { "path": "title", "type": "text" },
        { "path": "views", "type": "number" },
        { "path": "author", "dbPath": "author_id", "type": "relationship", "refList": "User" },
        { "path": "tags", "type": "relationship", "refList": "Tag", "many": true }
      ]
    },
    {
      "key": "User",
      "collection": "users",
      "fields": [
        { "path": "name", "type": "text" },
        { "path": "posts", "type": "relationship", "refList": "Post", "many": true }
      ]
    },
    { "key": "Tag", "collection": "tags", "fields": [ { "path": "name", "type": "text" } ] }
  ]
}"#;

fuzz_target!(|data: &[u8]| {
    let Ok(filter) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    if ensure_max_depth(&filter, 32).is_err() {
        return;
    }

    let Ok(schema) = Schema::from_json(SCHEMA) else {
        return;
    };
    let config = ParserConfig::default();
    let adapter = MongoAdapter::new(&config);
    let Ok(parser) = adapter.parser(&schema, config) else {
        return;
    };

    if let Ok(result) = parser.compile("Post", &filter) {
        // Whatever compiles must serialize
        let _ = serde_json::to_string(&result);
    }
});
