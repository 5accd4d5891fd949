//! Starter document written by `liveplay init`.

use super::SectionModel;

const IMPORTS: &str = r#"import React, { Component, } from 'react';
import {
  AppRegistry,
  StyleSheet,
  Text,
  View,
} from 'react-native';"#;

const STYLE: &str = r#"const styles = StyleSheet.create({
  container: {
    flex: 1,
    justifyContent: 'center',
    alignItems: 'center',
    backgroundColor: '#F5FCFF',
  },
  welcome: {
    fontSize: 20,
    textAlign: 'center',
    margin: 10,
  },
});"#;

const CODE: &str = r#"class App extends Component {
  render() {
    return (
      <View style={styles.container}>
        <Text style={styles.welcome}>
          Welcome to React Native!
        </Text>
      </View>
    );
  }
}

AppRegistry.registerComponent('App', () => App);"#;

/// Ordered `(name, content)` pairs of the starter document.
pub const SAMPLE_SECTIONS: [(&str, &str); 3] = [
    ("1. Imports", IMPORTS),
    ("2. Style", STYLE),
    ("3. Code", CODE),
];

pub fn sample_document() -> SectionModel {
    // Names are distinct and non-empty, so this cannot fail.
    SectionModel::from_sections(SAMPLE_SECTIONS)
        .unwrap_or_else(|_| SectionModel::single(CODE))
}

/// Pretty JSON form, as stored on disk.
pub fn sample_json() -> String {
    sample_document().to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    #[test]
    fn test_sample_has_three_sections() {
        let doc = sample_document();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.line_count("1. Imports"), Some(7));
    }

    #[test]
    fn test_sample_json_parses_back() {
        let doc = parse_document(&sample_json(), true);
        assert_eq!(
            doc.names().collect::<Vec<_>>(),
            ["1. Imports", "2. Style", "3. Code"]
        );
        assert_eq!(doc.get("2. Style"), Some(STYLE));
    }
}
