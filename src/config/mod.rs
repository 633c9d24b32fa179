pub(crate) mod scene_def;
