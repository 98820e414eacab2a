//! The fixed catalogue of rules every generated build file carries.
//!
//! Commands reference toolchain globals (`$CXX`, `$WIN_CL32`, ...), layout
//! globals (`$src`, `$dst`), project tool globals (`$importer`,
//! `$posixify`), and edge-local bindings documented next to the builder
//! operation that sets them.

use super::{DepsFormat, Rule, RuleRegistry};
use crate::graph::{Builder, EdgeSpec, GraphError, REVISION, REVSHORT};
use crate::template::Vars;

const GCC_DEPFILE: &str = "$out.d";

fn catalogue() -> Vec<Rule> {
    vec![
        Rule::new("config", "CONFIG", "$regen_env $generator -q"),
        Rule::new("revstamp", "REVSTAMP", "$in $src $out"),
        Rule::new(
            "importation",
            "IMPORTATION $in",
            concat!(
                "$importer -i $in -o $out -I $dst -I $src $options --depsout $depfile ",
                "$importation_defines -FREVISION=$dst/gen/REVISION -FREVSHORT=$dst/gen/REVSHORT",
            ),
        )
        .with_depfile(GCC_DEPFILE, DepsFormat::Gcc),
        Rule::new(
            "compile",
            "CXX $in",
            "$CXX $CFLAGS $in -o $out $LIBS -MD -MF $depfile && strip $STRIP_ARGS $out",
        )
        .with_depfile(GCC_DEPFILE, DepsFormat::Gcc),
        Rule::new(
            "compile_sim",
            "CXX_SIM $in",
            "$CXX $SIM_CFLAGS $CFLAGS $in -o $out $LIBS -MD -MF $depfile && strip $STRIP_ARGS $out",
        )
        .with_depfile(GCC_DEPFILE, DepsFormat::Gcc),
        Rule::new(
            "compile_win32",
            "WIN_CL32 $in",
            "$WIN_CL32 /showIncludes /nologo /c /Fo$out $WIN_CFLAGS $in | $posixify && touch $out",
        )
        .with_deps(DepsFormat::Msvc),
        Rule::new(
            "compile_win64",
            "WIN_CL64 $in",
            "$WIN_CL64 /showIncludes /nologo /c /Fo$out $WIN_CFLAGS $in | $posixify && touch $out",
        )
        .with_deps(DepsFormat::Msvc),
        Rule::new(
            "link_win32",
            "WIN_LINK32 $in",
            "$WIN_LINK32 /nologo /OUT:$out $WIN_LFLAGS32 $in && touch $out && chmod a+x $out",
        ),
        Rule::new(
            "link_win64",
            "WIN_LINK64 $in",
            "$WIN_LINK64 /nologo /OUT:$out $WIN_LFLAGS64 $in && touch $out && chmod a+x $out",
        ),
        Rule::new(
            "rc_win32",
            "WIN_RC32 $in",
            "$WIN_RC32 /nologo /i $src /fo $out $in && touch $out",
        ),
        Rule::new(
            "rc_win64",
            "WIN_RC64 $in",
            "$WIN_RC64 /nologo /i $src /fo $out $in && touch $out",
        ),
        Rule::new("run", "RUN $in", "$in >$out"),
        Rule::new("resize", "RESIZE $size", "convert -resize $size $in $out"),
        Rule::new("convert_image", "IMAGE_CONVERT $in", "convert $in $out"),
        Rule::new(
            "zip",
            "ZIP",
            "rm -f $out && cd $base && zip $relout $relin >/dev/null",
        ),
        Rule::new("copy", "COPY $in", "cp $in $out"),
        Rule::new("gen_run", "GEN_RUN $script", "$script $options $infiles >$out"),
        Rule::new("oneshot", "ONESHOT", "echo oneshot"),
        Rule::new(
            "test_run",
            "TEST $test",
            "$importer -i $test -o $out --depsout $depfile --no-out && $interp $program $test >$out",
        )
        .with_depfile(GCC_DEPFILE, DepsFormat::Gcc),
        Rule::new("clean", "CLEAN", "rm -rf $dst/"),
        Rule::new("all_clean", "ALL_CLEAN", "rm -rf $dst/ && rm build.ninja"),
    ]
}

/// Build the registry holding the standard rule catalogue.
///
/// # Errors
///
/// Returns [`GraphError::DuplicateRule`] if the catalogue names a rule twice.
///
/// ```
/// let rules = kumiki::rules::standard()?;
/// assert!(rules.get("importation").is_some());
/// assert!(rules.get("phony").is_none());
/// # Ok::<(), kumiki::graph::GraphError>(())
/// ```
pub fn standard() -> Result<RuleRegistry, GraphError> {
    let mut registry = RuleRegistry::default();
    for rule in catalogue() {
        registry.register(rule)?;
    }
    Ok(registry)
}

/// Globals naming the project tools the catalogue commands invoke.
///
/// `importation_defines` starts empty so units can append `-D` flags to it;
/// `options` is the fallback for importation edges that pass none.
#[must_use]
pub fn tool_globals() -> Vars {
    [
        ("importer", "$src/tools/importation.py"),
        ("posixify", "$src/tools/posixify.py"),
        ("revstamp_script", "$src/tools/revstamp.py"),
        ("importation_defines", ""),
        ("options", ""),
        ("SIM_CFLAGS", "-DSIMULATOR=1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

/// Append the edges every build file starts with: the revision stamps and
/// the two clean targets.
///
/// # Errors
///
/// Returns [`GraphError::UnknownRule`] if the registry lacks the catalogue.
pub fn prelude(builder: &mut Builder<'_>) -> Result<(), GraphError> {
    builder.add_edge(EdgeSpec {
        rule: "revstamp".to_owned(),
        targets: vec![REVISION.to_owned(), REVSHORT.to_owned()],
        sources: vec!["$revstamp_script".to_owned()],
        ..EdgeSpec::default()
    })?;
    for (target, rule) in [("clean", "clean"), ("allclean", "all_clean")] {
        builder.add_edge(EdgeSpec {
            rule: rule.to_owned(),
            targets: vec![target.to_owned()],
            ..EdgeSpec::default()
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "the catalogue is static")]

    use super::*;
    use crate::graph::{BuildGraph, Transform};
    use crate::template::references;

    #[test]
    fn catalogue_has_unique_names() {
        let registry = standard().expect("standard catalogue");
        assert_eq!(registry.len(), catalogue().len());
    }

    #[test]
    fn every_transform_has_a_rule() {
        let registry = standard().expect("standard catalogue");
        for kind in Transform::ALL {
            assert!(
                registry.get(kind.rule()).is_some(),
                "missing rule for {kind:?}"
            );
        }
    }

    #[test]
    fn depfile_rules_reference_their_depfile() {
        let registry = standard().expect("standard catalogue");
        for rule in registry.iter().filter(|r| r.depfile.is_some()) {
            assert!(
                references(&rule.command).contains(&"depfile"),
                "{} writes no depfile",
                rule.name
            );
        }
    }

    #[test]
    fn msvc_rules_use_show_includes() {
        let registry = standard().expect("standard catalogue");
        for rule in registry
            .iter()
            .filter(|r| r.deps == Some(DepsFormat::Msvc))
        {
            assert!(rule.command.contains("/showIncludes"), "{}", rule.name);
            assert_eq!(rule.depfile, None);
        }
    }

    #[test]
    fn prelude_stamps_revisions_and_cleans() {
        let mut graph = BuildGraph::new(tool_globals(), standard().expect("catalogue"));
        prelude(&mut graph.builder()).expect("prelude");
        let edges: Vec<_> = graph
            .edges
            .iter()
            .map(|e| (e.rule.as_str(), e.targets.join(" ")))
            .collect();
        assert_eq!(
            edges,
            [
                ("revstamp", format!("{REVISION} {REVSHORT}")),
                ("clean", "clean".to_owned()),
                ("all_clean", "allclean".to_owned()),
            ]
        );
    }
}
